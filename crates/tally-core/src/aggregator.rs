//! Per-batch orchestration: decode, count, suppress unchanged, encode.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::decode::{CountMap, DecodeError, count_labels, decode_batch};
use crate::dedup::Deduplicator;
use crate::payload::{Summary, encode};
use crate::threshold::Threshold;

/// Why a successfully decoded batch produced nothing to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppressed {
    /// No detection in the batch passed the threshold.
    Empty,
    /// Every label's count matched the previous batch.
    Unchanged,
}

impl Suppressed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Result of processing one inbound batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Publish(Summary),
    Suppressed(Suppressed),
}

/// Owns the threshold and the previous batch's counts.
///
/// Batches must be fed in delivery order; callers that receive concurrently
/// hold the aggregator behind a lock.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    threshold: Threshold,
    dedup: Deduplicator,
    received: u64,
}

impl Aggregator {
    pub fn new(threshold: Threshold) -> Self {
        Self {
            threshold,
            dedup: Deduplicator::new(),
            received: 0,
        }
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Number of batches handed to the aggregator, including rejected ones.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Full counts of the last successfully decoded batch.
    pub fn previous(&self) -> &CountMap {
        self.dedup.previous()
    }

    pub fn process(&mut self, payload: &str) -> Result<Outcome, DecodeError> {
        self.process_at(payload, Utc::now())
    }

    /// Process a raw inbound message. Bytes that are not UTF-8 are rejected
    /// like any other undecodable batch.
    pub fn process_bytes(&mut self, payload: &[u8]) -> Result<Outcome, DecodeError> {
        match std::str::from_utf8(payload) {
            Ok(text) => self.process(text),
            Err(e) => {
                self.received += 1;
                Err(DecodeError::Utf8(e))
            }
        }
    }

    /// Process one batch, stamping any summary with `now`.
    ///
    /// A decode error leaves the remembered counts untouched. An empty batch
    /// still replaces them, so the next non-empty batch is reported in full.
    pub fn process_at(&mut self, payload: &str, now: DateTime<Utc>) -> Result<Outcome, DecodeError> {
        self.received += 1;

        let batch = decode_batch(payload)?;
        let counts = count_labels(&batch.detections, self.threshold);
        debug!(
            message = self.received,
            detections = batch.detections.len(),
            skipped = batch.skipped,
            labels = counts.len(),
            "batch decoded"
        );

        let empty = counts.is_empty();
        let emitted = self.dedup.reduce(counts);

        if empty {
            return Ok(Outcome::Suppressed(Suppressed::Empty));
        }
        if emitted.is_empty() {
            return Ok(Outcome::Suppressed(Suppressed::Unchanged));
        }
        Ok(Outcome::Publish(encode(&emitted, now)))
    }
}
