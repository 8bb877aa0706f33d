//! Confidence cutoff applied before counting.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThresholdError {
    #[error("confidence threshold {0:?} is not a number")]
    Invalid(String),
    #[error("confidence threshold must be finite")]
    NotFinite,
}

/// Minimum confidence a detection must exceed to be counted.
///
/// The comparison is strict: a detection whose confidence equals the
/// threshold is not counted.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    pub const DEFAULT: f64 = 0.5;

    pub fn new(value: f64) -> Result<Self, ThresholdError> {
        if !value.is_finite() {
            return Err(ThresholdError::NotFinite);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether a detection with `confidence` passes the cutoff.
    pub fn admits(&self, confidence: f64) -> bool {
        confidence > self.0
    }

    /// Confidences are expected, though not required, to lie in `[0, 1]`.
    pub fn is_conventional(&self) -> bool {
        (0.0..=1.0).contains(&self.0)
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl FromStr for Threshold {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| ThresholdError::Invalid(s.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
