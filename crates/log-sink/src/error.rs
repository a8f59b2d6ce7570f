use thiserror::Error;

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the log sink.
#[derive(Debug, Error)]
pub enum Error {
    /// Sink was started twice.
    #[error("log sink already started")]
    AlreadyStarted,

    /// Consumer create error.
    #[error("failed to create consumer: {0}")]
    CreateConsumer(async_nats::jetstream::stream::ConsumerErrorKind),

    /// Stream create error.
    #[error("failed to create stream: {0}")]
    CreateStream(async_nats::jetstream::context::CreateStreamErrorKind),

    /// IO operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

    /// Payload declared as JSON failed to parse.
    #[error("malformed json payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// Consumer messages error.
    #[error("failed to get consumer messages: {0}")]
    Messages(async_nats::jetstream::consumer::pull::MessagesErrorKind),

    /// Consumer stream error.
    #[error("consumer stream error: {0}")]
    Stream(async_nats::jetstream::consumer::StreamErrorKind),
}
