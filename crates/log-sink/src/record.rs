use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use serde_json::Value;

use crate::error::Result;

/// Header producers set to describe the payload encoding.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Content type marking payloads that carry a structured event object.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// One message handed over by the broker. Owned by the broker until acked.
#[derive(Clone, Debug)]
pub struct Delivery {
    /// Value of the content type header, when the producer set one.
    pub content_type: Option<String>,

    /// Raw payload bytes.
    pub body: Bytes,
}

impl Delivery {
    /// Resolves how the payload should be interpreted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedPayload`] when the content type claims
    /// JSON but the body does not parse.
    pub fn classify(&self) -> Result<Payload> {
        if self.content_type.as_deref() == Some(CONTENT_TYPE_JSON) {
            let value = serde_json::from_slice(&self.body)?;
            Ok(Payload::Structured(value))
        } else {
            Ok(Payload::Opaque(
                String::from_utf8_lossy(&self.body).into_owned(),
            ))
        }
    }
}

/// Payload interpretation, resolved once per delivery.
#[derive(Clone, Debug)]
pub enum Payload {
    /// Body parsed as JSON.
    Structured(Value),

    /// Body taken as plain text.
    Opaque(String),
}

/// A single normalized log entry. Exists only until rendered as a line.
#[derive(Clone, Debug)]
pub struct LogRecord {
    /// Seconds since the Unix epoch.
    pub timestamp: f64,

    /// Line content.
    pub message: String,
}

impl LogRecord {
    /// Builds a record from a classified payload.
    ///
    /// Structured payloads must carry a numeric `timestamp` and a string
    /// `message`; anything else has nothing to log and yields `None`. Opaque
    /// payloads are stamped with `now` since the original publish time is not
    /// recoverable for them.
    #[must_use]
    pub fn from_payload(payload: Payload, now: f64) -> Option<Self> {
        match payload {
            Payload::Structured(value) => {
                let timestamp = value.get("timestamp")?.as_f64()?;
                let message = value.get("message")?.as_str()?.to_owned();

                Some(Self { timestamp, message })
            }
            Payload::Opaque(text) => Some(Self {
                timestamp: now,
                message: text,
            }),
        }
    }

    /// Renders the record as one log line, timestamp fixed to six decimals.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("{:.6} : {}\n", self.timestamp, self.message)
    }
}

/// Current wall clock as fractional seconds since the Unix epoch.
pub(crate) fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
