mod config;
mod display;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tally_core::{Aggregator, count_labels, decode_batch, encode};
use tally_edge::{HttpPublisher, Publisher, SharedAggregator, StdoutPublisher, run_lines};
use tokio::io::AsyncReadExt;
use tracing::{Instrument, info, info_span, warn};
use tracing_subscriber::EnvFilter;

use config::{Cli, Command, Config};

const DEFAULT_LOG_FILTER: &str = "tally=info,tally_core=info,tally_edge=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries published summaries.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.settings.resolve();
    info!(
        min_confidence = %config.threshold,
        device = %config.device_id,
        "tally v{}",
        env!("CARGO_PKG_VERSION")
    );

    match cli.command {
        Command::Run => run(config).await,
        Command::Count { file } => count(config, file.as_deref()).await,
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let aggregator = SharedAggregator::new(Aggregator::new(config.threshold));

    let publisher: Box<dyn Publisher> = match &config.publish_url {
        Some(url) => {
            info!(url = %url, "publishing summaries over HTTP");
            Box::new(HttpPublisher::new(url.clone(), config.device_id.clone()))
        }
        None => Box::new(StdoutPublisher::stdout()),
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C; running until input closes");
            std::future::pending::<()>().await;
        }
    };

    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    let stats = run_lines(reader, &aggregator, publisher.as_ref(), shutdown)
        .instrument(info_span!("receive", device = %config.device_id))
        .await
        .context("reading inbound messages")?;

    info!(
        received = stats.received,
        published = stats.published,
        suppressed = stats.suppressed,
        rejected = stats.rejected,
        publish_failed = stats.publish_failed,
        "receive loop stopped"
    );
    info!(labels = aggregator.previous().await.len(), "last batch remembered");
    Ok(())
}

async fn count(config: Config, file: Option<&Path>) -> anyhow::Result<()> {
    let payload = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("reading stdin")?;
            buf
        }
    };

    let batch = decode_batch(&payload).context("decoding detection batch")?;
    let counts = count_labels(&batch.detections, config.threshold);
    display::print_batch_card(&batch, &counts, config.threshold).context("printing batch card")?;

    let summary = encode(&counts, chrono::Utc::now());
    if summary.is_empty() {
        warn!("no detection above threshold; summary would not be published");
    }
    println!();
    println!("{}", summary.to_json()?);
    Ok(())
}
