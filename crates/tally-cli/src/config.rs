//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tally_core::Threshold;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version,
    about = "Count object detections per label and publish what changed"
)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read newline-delimited detection batches from stdin and publish changed counts
    Run,
    /// Count a single detection batch and print the resulting summary
    Count {
        /// JSON batch file; reads stdin when omitted
        file: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct Settings {
    /// Minimum confidence a detection must exceed to be counted [default: 0.5]
    #[arg(long, env = "TALLY_MIN_CONFIDENCE", global = true)]
    pub min_confidence: Option<String>,

    /// Identity reported with published summaries [default: random UUID]
    #[arg(long, env = "TALLY_DEVICE_ID", global = true)]
    pub device_id: Option<String>,

    /// Collector base URL; summaries go to stdout when unset
    #[arg(long, env = "TALLY_PUBLISH_URL", global = true)]
    pub publish_url: Option<String>,
}

/// Settings resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub threshold: Threshold,
    pub device_id: String,
    pub publish_url: Option<String>,
}

impl Settings {
    pub fn resolve(self) -> Config {
        let device_id = match self.device_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => uuid::Uuid::new_v4().to_string(),
        };
        let publish_url = self.publish_url.filter(|url| !url.trim().is_empty());

        Config {
            threshold: resolve_threshold(self.min_confidence.as_deref()),
            device_id,
            publish_url,
        }
    }
}

/// Parse the configured threshold, falling back to the default when it is
/// absent or unusable.
pub fn resolve_threshold(raw: Option<&str>) -> Threshold {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Threshold::default();
    };
    match raw.parse::<Threshold>() {
        Ok(threshold) => {
            if !threshold.is_conventional() {
                warn!(%threshold, "confidence threshold outside [0, 1]");
            }
            threshold
        }
        Err(e) => {
            warn!(error = %e, default = Threshold::DEFAULT, "ignoring confidence threshold");
            Threshold::default()
        }
    }
}
