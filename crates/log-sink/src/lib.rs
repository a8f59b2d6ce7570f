//! Log sink for the SDR event pipeline. Subscribes to the broadcast log
//! stream and appends one normalized line per event to a file on disk.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod config;
mod error;
mod record;
mod writer;

pub use config::{DEFAULT_LOG_DIR, DEFAULT_LOG_FILE, resolve_log_path};
pub use error::{Error, Result};
pub use record::{CONTENT_TYPE_HEADER, CONTENT_TYPE_JSON, Delivery, LogRecord, Payload};
pub use writer::{LogWriter, WriteOutcome};

use std::path::PathBuf;

use async_nats::Client;
use async_nats::jetstream::consumer::Consumer;
use async_nats::jetstream::consumer::pull::Config as ConsumerConfig;
use async_nats::jetstream::stream::Config as StreamConfig;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Name of the broadcast stream producers publish log events to. Every
/// consumer bound to it observes every event.
pub const LOG_STREAM_NAME: &str = "logs";

/// Durable consumer name. Outlives any single connection to the broker.
pub const LOG_CONSUMER_NAME: &str = "event_logs";

/// Options for the log sink.
pub struct LogSinkOptions {
    /// Connected NATS client.
    pub client: Client,

    /// Destination log file.
    pub log_path: PathBuf,
}

/// Subscribes to the log stream and appends every event to the log file.
///
/// Deliveries are handled strictly one at a time; a delivery is acknowledged
/// after its outcome is known, even when the append failed. Write failures
/// never stop the receive loop.
pub struct LogSink {
    client: Client,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
    writer: LogWriter,
}

impl LogSink {
    /// Creates a new log sink.
    #[must_use]
    pub fn new(LogSinkOptions { client, log_path }: LogSinkOptions) -> Self {
        Self {
            client,
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
            writer: LogWriter::new(log_path),
        }
    }

    /// Declares the log stream and durable consumer, then spawns the receive
    /// loop and returns its join handle. Declarations are idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink was already started or if the stream or
    /// consumer cannot be declared.
    pub async fn start(&self) -> Result<JoinHandle<Result<()>>> {
        if self.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        let jetstream_context = async_nats::jetstream::new(self.client.clone());

        jetstream_context
            .create_stream(StreamConfig {
                name: LOG_STREAM_NAME.to_string(),
                ..Default::default()
            })
            .await
            .map_err(|e| Error::CreateStream(e.kind()))?;

        let consumer = jetstream_context
            .create_consumer_on_stream(
                ConsumerConfig {
                    durable_name: Some(LOG_CONSUMER_NAME.to_string()),
                    ..Default::default()
                },
                LOG_STREAM_NAME,
            )
            .await
            .map_err(|e| Error::CreateConsumer(e.kind()))?;

        let shutdown_token = self.shutdown_token.clone();
        let writer = self.writer.clone();

        let sink_task = self
            .task_tracker
            .spawn(Self::process_deliveries(consumer, writer, shutdown_token));

        self.task_tracker.close();

        Ok(sink_task)
    }

    /// Cancels the receive loop and waits for it to finish. A delivery in
    /// flight is handled to completion first.
    pub async fn shutdown(&self) {
        info!("log sink shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.wait().await;

        info!("log sink shutdown");
    }

    async fn process_deliveries(
        consumer: Consumer<ConsumerConfig>,
        writer: LogWriter,
        shutdown_token: CancellationToken,
    ) -> Result<()> {
        let mut messages = consumer
            .messages()
            .await
            .map_err(|e| Error::Stream(e.kind()))?;

        while let Some(message) = Self::next_or_cancelled(&mut messages, &shutdown_token).await {
            let message = message.map_err(|e| Error::Messages(e.kind()))?;

            let delivery = Delivery {
                content_type: message.headers.as_ref().and_then(|headers| {
                    headers
                        .get(CONTENT_TYPE_HEADER)
                        .map(|value| value.as_str().to_owned())
                }),
                body: message.payload.clone(),
            };

            let outcome = writer.handle(&delivery).await;
            if let Some(e) = outcome.failure() {
                error!(path = %writer.path().display(), error = %e, "failed to sink delivery");
            }

            // Failed deliveries are acked too; the sink is best-effort.
            if let Err(e) = message.ack().await {
                warn!(error = %e, "failed to ack delivery");
            }
        }

        Ok(())
    }

    /// Waits for the next message, ending the wait when shutdown is requested.
    ///
    /// Cancellation is only observed here, at the idle point; a message
    /// already pulled is handled and acked before the loop exits.
    async fn next_or_cancelled<S>(
        messages: &mut S,
        shutdown_token: &CancellationToken,
    ) -> Option<S::Item>
    where
        S: Stream + Unpin + Send,
        S::Item: Send,
    {
        tokio::select! {
            next = messages.next() => next,
            () = shutdown_token.cancelled() => None,
        }
    }
}
