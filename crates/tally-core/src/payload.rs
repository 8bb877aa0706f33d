//! Outbound summary payload.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::decode::CountMap;

/// One label and how many times it was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Per-label counts published downstream.
///
/// Serialises as `{"timestamp": "...", "data": [{"label": "Car", "count": 2}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// ISO 8601 (RFC 3339, UTC) time the summary was encoded.
    pub timestamp: String,
    pub data: Vec<LabelCount>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Encode `counts` as a summary stamped with `now`, one entry per label in label order.
pub fn encode(counts: &CountMap, now: DateTime<Utc>) -> Summary {
    Summary {
        timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, true),
        data: counts
            .iter()
            .map(|(label, count)| LabelCount {
                label: label.clone(),
                count: *count,
            })
            .collect(),
    }
}
