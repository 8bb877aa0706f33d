pub mod aggregator;
pub mod decode;
pub mod dedup;
pub mod detection;
pub mod payload;
pub mod threshold;

pub use aggregator::{Aggregator, Outcome, Suppressed};
pub use decode::{Batch, CountMap, DecodeError, count_labels, decode_batch, decode_counts};
pub use dedup::{Deduplicator, changed_counts};
pub use detection::{Detection, FieldSkip, WireDetection, parse_confidence};
pub use payload::{LabelCount, Summary, encode};
pub use threshold::{Threshold, ThresholdError};
