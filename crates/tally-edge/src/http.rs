//! HTTP publisher for pushing summaries to a collector endpoint.

use async_trait::async_trait;
use tally_core::Summary;
use tracing::debug;

use crate::publish::{PublishError, Publisher};

/// Header carrying the publishing device's identity.
pub const DEVICE_HEADER: &str = "X-Device-Id";

/// POSTs each summary as JSON to `{base_url}/api/summaries`.
pub struct HttpPublisher {
    client: reqwest::Client,
    base_url: String,
    device_id: String,
}

impl HttpPublisher {
    /// Create a publisher for the given collector base URL.
    ///
    /// `base_url` should be like `http://localhost:4000`; a trailing slash is trimmed.
    pub fn new(base_url: String, device_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            device_id,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/summaries", self.base_url)
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, summary: &Summary) -> Result<(), PublishError> {
        let url = self.endpoint();

        debug!(url = %url, labels = summary.data.len(), "posting summary");
        let resp = self
            .client
            .post(&url)
            .header(DEVICE_HEADER, &self.device_id)
            .json(summary)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let publisher = HttpPublisher::new("http://localhost:4000/".into(), "cam-1".into());
        assert_eq!(publisher.base_url, "http://localhost:4000");
        assert_eq!(publisher.endpoint(), "http://localhost:4000/api/summaries");
    }

    #[test]
    fn keeps_device_identity() {
        let publisher = HttpPublisher::new("http://collector".into(), "cam-7".into());
        assert_eq!(publisher.device_id, "cam-7");
    }
}
