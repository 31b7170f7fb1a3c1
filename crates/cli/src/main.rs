//! Build notifier entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Read configuration**: build a [`config::Config`] from the environment
//!    once, before anything else runs.
//! 2. **Wire observability**: configure `tracing-subscriber` with a JSON layer
//!    and, when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OpenTelemetry OTLP
//!    exporter. All `tracing` spans and events from every crate flow through it.
//! 3. **Construct infrastructure**: create the [`bitbucket::BitbucketClient`]
//!    and inject it into a [`notification::Notifier`].
//! 4. **Select trigger mode**:
//!    - `serve`: run the Pub/Sub push listener.
//!    - `notify`: handle one build result read from a file or stdin.

mod config;
mod observability;

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bitbucket::BitbucketClient;
use clap::{Parser, Subcommand};
use listener::PushEnvelope;
use notification::{Notifier, PubSubMessage};
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "build-notifier",
    version,
    about = "Reports Cloud Build results as Bitbucket commit statuses"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Receive Pub/Sub push deliveries over HTTP.
    Serve {
        /// Address to bind. Defaults to 0.0.0.0 on `PORT`.
        #[arg(long, env = "LISTEN_ADDR")]
        addr: Option<SocketAddr>,
    },
    /// Handle a single build result and exit.
    Notify {
        /// File holding the build result JSON; `-` reads stdin.
        #[arg(long, short, default_value = "-")]
        input: PathBuf,
        /// Treat the input as a Pub/Sub push request body instead of a bare
        /// build result.
        #[arg(long)]
        envelope: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;
    let telemetry = observability::init(config.otlp_endpoint.as_deref())?;

    let result = run(cli.command, config).await;

    telemetry.shutdown();
    result
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let notifier = Arc::new(build_notifier(&config)?);

    match command {
        Command::Serve { addr } => {
            let addr =
                addr.unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port)));
            listener::serve(addr, notifier).await?;
        }
        Command::Notify { input, envelope } => {
            let bytes = read_input(&input).await?;
            let message = if envelope {
                PushEnvelope::from_slice(&bytes)
                    .context("input is not a Pub/Sub push request")?
                    .message
            } else {
                PubSubMessage::from_data(bytes)
            };

            let receipt = notifier.notify(&message).await?;
            info!(status = receipt.status, "Notification sent");
        }
    }

    Ok(())
}

fn build_notifier(config: &Config) -> anyhow::Result<Notifier> {
    let client = BitbucketClient::new(config.credentials.clone())
        .context("failed to create Bitbucket client")?;
    info!(
        api_base = %config.api_base,
        error_status_policy = ?config.error_status_policy,
        "Bitbucket status publisher ready"
    );

    Ok(Notifier::new(Arc::new(client))
        .with_api_base(config.api_base.clone())
        .with_error_status_policy(config.error_status_policy))
}

async fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .context("failed to read stdin")?;
        return Ok(buf);
    }

    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}
