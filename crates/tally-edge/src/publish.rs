//! Outbound summary publishers.

use async_trait::async_trait;
use tally_core::Summary;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum PublishError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Hands a summary to whatever sits downstream of this stage.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, summary: &Summary) -> Result<(), PublishError>;
}

/// Writes each summary as one JSON line.
pub struct LinePublisher<W> {
    out: Mutex<W>,
}

/// [`LinePublisher`] on the process's standard output.
pub type StdoutPublisher = LinePublisher<tokio::io::Stdout>;

impl<W> LinePublisher<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl LinePublisher<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W> Publisher for LinePublisher<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn publish(&self, summary: &Summary) -> Result<(), PublishError> {
        let mut line = summary.to_json()?;
        line.push('\n');

        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}
