//! Receive loop: one inbound message per line, processed in arrival order.

use std::future::Future;
use std::sync::Arc;

use tally_core::{Aggregator, CountMap, DecodeError, Outcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::publish::Publisher;

/// An [`Aggregator`] that can be shared between concurrent handlers.
///
/// The lock serialises batches so each one is compared against the batch
/// processed immediately before it.
#[derive(Clone, Default)]
pub struct SharedAggregator(Arc<Mutex<Aggregator>>);

impl SharedAggregator {
    pub fn new(aggregator: Aggregator) -> Self {
        Self(Arc::new(Mutex::new(aggregator)))
    }

    /// Process one raw message, returning its process-wide sequence number
    /// alongside the outcome.
    pub async fn process(&self, payload: &[u8]) -> (u64, Result<Outcome, DecodeError>) {
        let mut aggregator = self.0.lock().await;
        let result = aggregator.process_bytes(payload);
        (aggregator.received(), result)
    }

    /// Copy of the counts remembered from the last batch.
    pub async fn previous(&self) -> CountMap {
        self.0.lock().await.previous().clone()
    }
}

/// Tally of what happened to each inbound message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub received: u64,
    pub published: u64,
    /// Messages dropped because they could not be decoded.
    pub rejected: u64,
    /// Decoded messages with nothing new to report.
    pub suppressed: u64,
    pub publish_failed: u64,
}

/// Process one inbound message and publish its summary, if any.
///
/// Errors are logged and recorded in `stats`; none of them stop the caller.
pub async fn handle_message<P>(
    aggregator: &SharedAggregator,
    publisher: &P,
    payload: &[u8],
    stats: &mut RunStats,
) where
    P: Publisher + ?Sized,
{
    stats.received += 1;
    let (message, result) = aggregator.process(payload).await;
    info!(message, bytes = payload.len(), "received message");

    match result {
        Err(e) => {
            warn!(message, error = %e, "dropping undecodable batch");
            stats.rejected += 1;
        }
        Ok(Outcome::Suppressed(reason)) => {
            debug!(message, reason = reason.as_str(), "nothing to publish");
            stats.suppressed += 1;
        }
        Ok(Outcome::Publish(summary)) => match publisher.publish(&summary).await {
            Ok(()) => {
                info!(message, labels = summary.data.len(), "summary published");
                stats.published += 1;
            }
            Err(e) => {
                error!(message, error = %e, "publish failed");
                stats.publish_failed += 1;
            }
        },
    }
}

/// Read newline-delimited messages from `reader` until EOF or `shutdown` resolves.
///
/// Lines are taken as raw bytes so a message that is not UTF-8 is rejected
/// on its own; only a read error ends the loop early. Blank lines are ignored
/// and do not count as messages.
pub async fn run_lines<R, P, S>(
    reader: R,
    aggregator: &SharedAggregator,
    publisher: &P,
    shutdown: S,
) -> std::io::Result<RunStats>
where
    R: AsyncBufRead + Unpin,
    P: Publisher + ?Sized,
    S: Future<Output = ()>,
{
    let mut lines = reader.split(b'\n');
    let mut stats = RunStats::default();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            line = lines.next_segment() => line?,
        };

        let Some(line) = line else {
            debug!("input closed");
            break;
        };

        let payload = line.trim_ascii();
        if payload.is_empty() {
            continue;
        }
        handle_message(aggregator, publisher, payload, &mut stats).await;
    }

    Ok(stats)
}
