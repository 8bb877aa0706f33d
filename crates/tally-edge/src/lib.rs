//! Edge plumbing: line-delimited receive loop, shared aggregator, summary publishers.

pub mod pipeline;
pub mod publish;

#[cfg(feature = "http")]
pub mod http;

pub use pipeline::{RunStats, SharedAggregator, handle_message, run_lines};
pub use publish::{LinePublisher, PublishError, Publisher, StdoutPublisher};

#[cfg(feature = "http")]
pub use http::HttpPublisher;
