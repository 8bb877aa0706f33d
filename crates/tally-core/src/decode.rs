//! Batch decoding and per-label counting.
//!
//! A batch arrives as one JSON document in either of two shapes:
//!
//! ```text
//! {"NEURAL_NETWORK": [{"label": "Car", "confidence": "0.93", ...}, ...]}
//! [{"NEURAL_NETWORK": [{"label": "Car", "confidence": "0.93", ...}, ...]}]
//! ```
//!
//! Every top-level key is treated as a channel and every channel's records
//! are counted together. Records that fail validation are skipped; only a
//! document that is not JSON, or not one of the shapes above, is an error.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::detection::Detection;
use crate::threshold::Threshold;

/// Label → number of admitted detections in one batch.
pub type CountMap = BTreeMap<String, usize>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[source] std::str::Utf8Error),
    #[error("payload is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("payload is not a detection batch: {0}")]
    Shape(#[source] serde_json::Error),
}

type Channels = BTreeMap<String, Vec<Value>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Channels(Channels),
    Wrapped(Vec<Channels>),
}

/// Validated detections from one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub detections: Vec<Detection>,
    /// Records left out because a field was missing or unparseable.
    pub skipped: usize,
}

/// Decode a batch document into validated detections.
///
/// Each record goes through [`WireDetection`](crate::WireDetection) validation;
/// failures are counted in [`Batch::skipped`] and logged at debug level.
pub fn decode_batch(payload: &str) -> Result<Batch, DecodeError> {
    let document: Value = serde_json::from_str(payload).map_err(DecodeError::Syntax)?;
    let envelope = Envelope::deserialize(document).map_err(DecodeError::Shape)?;

    let channels = match envelope {
        Envelope::Channels(channels) => vec![channels],
        Envelope::Wrapped(wrapped) => wrapped,
    };

    let mut batch = Batch::default();
    for (channel, records) in channels.into_iter().flatten() {
        for (index, record) in records.into_iter().enumerate() {
            match Detection::try_from(record) {
                Ok(detection) => batch.detections.push(detection),
                Err(reason) => {
                    debug!(channel = %channel, index, %reason, "skipping detection record");
                    batch.skipped += 1;
                }
            }
        }
    }
    Ok(batch)
}

/// Count detections per label, keeping only those above `threshold`.
///
/// Labels are compared exactly; `"Car"` and `"car"` are separate keys.
pub fn count_labels(detections: &[Detection], threshold: Threshold) -> CountMap {
    let mut counts = CountMap::new();
    for detection in detections {
        if threshold.admits(detection.confidence) {
            *counts.entry(detection.label.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Decode a batch and reduce it to per-label counts in one step.
pub fn decode_counts(payload: &str, threshold: Threshold) -> Result<CountMap, DecodeError> {
    let batch = decode_batch(payload)?;
    Ok(count_labels(&batch.detections, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"NEURAL_NETWORK": [
        {"bbox": [0.799, 0.740, 0.940, 0.904], "label": "Car", "confidence": "0.932598", "timestamp": "1644415478571327732"},
        {"bbox": [0.575, 0.542, 0.608, 0.567], "label": "Car", "confidence": "0.519588", "timestamp": "1644415478571327732"},
        {"bbox": [0.575, 0.542, 0.608, 0.567], "label": "Truck", "confidence": "0.419588", "timestamp": "1644415478571327732"},
        {"bbox": [0.575, 0.542, 0.608, 0.567], "label": "cat", "confidence": "0.519588", "timestamp": "1644415478571327732"}
    ]}"#;

    fn counts(payload: &str) -> CountMap {
        decode_counts(payload, Threshold::default()).unwrap()
    }

    fn map(entries: &[(&str, usize)]) -> CountMap {
        entries.iter().map(|&(l, c)| (l.to_string(), c)).collect()
    }

    #[test]
    fn sample_batch_counts_above_threshold() {
        assert_eq!(counts(SAMPLE), map(&[("Car", 2), ("cat", 1)]));
    }

    #[test]
    fn wrapped_shape_is_accepted() {
        let wrapped = format!("[{SAMPLE}]");
        assert_eq!(counts(&wrapped), map(&[("Car", 2), ("cat", 1)]));
    }

    #[test]
    fn single_record_wrapped() {
        let payload = r#"[{"NEURAL_NETWORK": [{"bbox": [0.365, 0.482, 0.902, 0.817], "label": "Car", "confidence": "0.9253182", "timestamp": "1644434533400484665"}]}]"#;
        assert_eq!(counts(payload), map(&[("Car", 1)]));
    }

    #[test]
    fn empty_inputs_yield_empty_counts() {
        for payload in [
            "{}",
            "[]",
            "[{}]",
            r#"{"NEURAL_NETWORK": []}"#,
            r#"[{"NEURAL_NETWORK": []}]"#,
        ] {
            assert!(counts(payload).is_empty(), "{payload} should be empty");
        }
    }

    #[test]
    fn channels_are_counted_together() {
        let payload = r#"{
            "front": [{"label": "Car", "confidence": "0.9"}],
            "rear": [{"label": "Car", "confidence": "0.8"}, {"label": "Bus", "confidence": "0.7"}]
        }"#;
        assert_eq!(counts(payload), map(&[("Bus", 1), ("Car", 2)]));
    }

    #[test]
    fn bad_records_are_skipped_not_fatal() {
        let payload = r#"{"NEURAL_NETWORK": [
            {"confidence": "0.9"},
            {"label": "Car"},
            {"label": "Car", "confidence": "n/a"},
            {"label": "Car", "confidence": 0.9},
            "not a record",
            {"label": "Car", "confidence": "0.9"}
        ]}"#;
        let batch = decode_batch(payload).unwrap();
        assert_eq!(batch.skipped, 5);
        assert_eq!(batch.detections.len(), 1);
        assert_eq!(counts(payload), map(&[("Car", 1)]));
    }

    #[test]
    fn threshold_is_exclusive() {
        let payload = r#"{"NEURAL_NETWORK": [
            {"label": "at", "confidence": "0.5"},
            {"label": "above", "confidence": "0.5000001"}
        ]}"#;
        assert_eq!(counts(payload), map(&[("above", 1)]));
    }

    #[test]
    fn custom_threshold_applies() {
        let strict = Threshold::new(0.9).unwrap();
        assert_eq!(decode_counts(SAMPLE, strict).unwrap(), map(&[("Car", 1)]));

        let lax = Threshold::new(0.0).unwrap();
        assert_eq!(
            decode_counts(SAMPLE, lax).unwrap(),
            map(&[("Car", 2), ("Truck", 1), ("cat", 1)])
        );
    }

    #[test]
    fn labels_are_case_sensitive() {
        let payload = r#"{"NEURAL_NETWORK": [
            {"label": "Car", "confidence": "0.9"},
            {"label": "car", "confidence": "0.9"},
            {"label": "CAR", "confidence": "0.9"}
        ]}"#;
        assert_eq!(counts(payload), map(&[("CAR", 1), ("Car", 1), ("car", 1)]));
    }

    #[test]
    fn invalid_json_is_a_syntax_error() {
        for payload in ["", "{", "not json", r#"{"NEURAL_NETWORK": [}"#] {
            assert!(
                matches!(decode_batch(payload), Err(DecodeError::Syntax(_))),
                "{payload:?} should be a syntax error"
            );
        }
    }

    #[test]
    fn wrong_shape_is_a_shape_error() {
        for payload in [
            "42",
            r#""NEURAL_NETWORK""#,
            "null",
            r#"{"NEURAL_NETWORK": {"label": "Car"}}"#,
            r#"{"NEURAL_NETWORK": "Car"}"#,
            r#"[{"NEURAL_NETWORK": []}, 5]"#,
        ] {
            assert!(
                matches!(decode_batch(payload), Err(DecodeError::Shape(_))),
                "{payload:?} should be a shape error"
            );
        }
    }
}
