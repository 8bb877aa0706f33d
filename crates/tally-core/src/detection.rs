//! Detection records emitted by the inference stage.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A detection record as it appears on the wire.
///
/// Every field is optional and loosely typed so that one bad record can be
/// skipped without failing the rest of its batch. Use [`WireDetection::validate`]
/// to obtain a [`Detection`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireDetection {
    #[serde(default)]
    pub label: Option<Value>,
    /// Decimal confidence encoded as text, e.g. `"0.932598"`.
    #[serde(default)]
    pub confidence: Option<Value>,
    /// Normalised `[x1, y1, x2, y2]`. Not used for counting.
    #[serde(default)]
    pub bbox: Option<Value>,
    /// Opaque capture token from the inference stage. Not used for counting.
    #[serde(default)]
    pub timestamp: Option<Value>,
}

/// A validated detection: a non-empty label and a parsed confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f64,
}

/// Why a single record was left out of its batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldSkip {
    #[error("record is not an object")]
    NotAnObject,
    #[error("record has no label")]
    MissingLabel,
    #[error("record label is empty")]
    EmptyLabel,
    #[error("record label is a {0}, expected a string")]
    LabelNotText(&'static str),
    #[error("record has no confidence")]
    MissingConfidence,
    #[error("record confidence is a {0}, expected a string")]
    ConfidenceNotText(&'static str),
    #[error("record confidence {0:?} is not a decimal number")]
    InvalidConfidence(String),
}

impl WireDetection {
    /// Decode one element of a channel array.
    pub fn from_value(value: Value) -> Result<Self, FieldSkip> {
        // Structs also deserialize from JSON arrays; only objects are records.
        if !value.is_object() {
            return Err(FieldSkip::NotAnObject);
        }
        serde_json::from_value(value).map_err(|_| FieldSkip::NotAnObject)
    }

    pub fn validate(self) -> Result<Detection, FieldSkip> {
        let label = match self.label {
            None => return Err(FieldSkip::MissingLabel),
            Some(Value::String(s)) if s.is_empty() => return Err(FieldSkip::EmptyLabel),
            Some(Value::String(s)) => s,
            Some(other) => return Err(FieldSkip::LabelNotText(kind(&other))),
        };

        let raw = match self.confidence {
            None => return Err(FieldSkip::MissingConfidence),
            Some(Value::String(s)) => s,
            Some(other) => return Err(FieldSkip::ConfidenceNotText(kind(&other))),
        };

        match parse_confidence(&raw) {
            Some(confidence) => Ok(Detection { label, confidence }),
            None => Err(FieldSkip::InvalidConfidence(raw)),
        }
    }
}

impl TryFrom<Value> for Detection {
    type Error = FieldSkip;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        WireDetection::from_value(value)?.validate()
    }
}

/// Parse a confidence string using the invariant decimal format.
///
/// Accepts ASCII digits with at most one `.` separator and at least one digit
/// (`"0.93"`, `"1"`, `".5"`, `"5."`). Signs, exponents, whitespace, group
/// separators and the named specials (`NaN`, `inf`) are rejected.
pub fn parse_confidence(raw: &str) -> Option<f64> {
    let mut digits = 0usize;
    let mut points = 0usize;
    for b in raw.bytes() {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' => points += 1,
            _ => return None,
        }
    }
    if digits == 0 || points > 1 {
        return None;
    }
    raw.parse().ok()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
