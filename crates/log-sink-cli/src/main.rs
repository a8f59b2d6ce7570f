//! CLI binary for the SDR event log sink.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

use clap::Parser;
use sdr_log_sink::{LogSink, LogSinkOptions, resolve_log_path};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Broker unreachable at startup
    #[error("failed to connect to nats: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// Log sink library error
    #[error(transparent)]
    Sink(#[from] sdr_log_sink::Error),

    /// Receive loop task failed to join
    #[error("log sink task failed: {0}")]
    SinkTask(#[from] tokio::task::JoinError),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log file path. Absolute paths are used verbatim; relative paths are
    /// placed in the default log directory
    log_path: Option<String>,

    /// NATS server URL
    #[arg(long, default_value = "nats://localhost:4222", env = "SDR_NATS_URL")]
    nats_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let log_path = resolve_log_path(args.log_path.as_deref());

    // Create shared shutdown token
    let shutdown_token = CancellationToken::new();

    // Set up signal handlers
    let signal_shutdown_token = shutdown_token.clone();
    tokio::spawn(async move {
        if cfg!(unix) {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler failed");
            let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT handler failed");

            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM"),
                _ = sigint.recv() => info!("Received SIGINT"),
            }
        } else {
            // Fall back to just ctrl-c on non-unix platforms
            let _ = tokio::signal::ctrl_c().await;
            info!("Received interrupt signal");
        }

        info!("Shutting down");
        signal_shutdown_token.cancel();
    });

    info!(path = %log_path.display(), "starting performance analyzer log sink");

    let client = async_nats::connect(&args.nats_url).await?;

    let sink = LogSink::new(LogSinkOptions { client, log_path });
    let sink_task = sink.start().await?;

    tokio::select! {
        () = shutdown_token.cancelled() => {
            sink.shutdown().await;

            Ok(())
        }
        result = sink_task => match result {
            Ok(loop_result) => loop_result.map_err(Error::Sink),
            Err(e) => Err(Error::SinkTask(e)),
        },
    }
}
