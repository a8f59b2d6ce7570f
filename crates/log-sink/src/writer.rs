use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::record::{Delivery, LogRecord, unix_timestamp};

/// Result of sinking one delivery.
#[derive(Debug)]
pub enum WriteOutcome {
    /// One line was appended to the log file.
    Written,

    /// Recognized payload with nothing to log. Silent.
    Dropped,

    /// Decode or append failed. Reported by the receive loop.
    Failed(Error),
}

impl WriteOutcome {
    /// The failure the receive loop should report, if any. `Written` and
    /// `Dropped` are silent.
    #[must_use]
    pub const fn failure(&self) -> Option<&Error> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Written | Self::Dropped => None,
        }
    }
}

/// Appends normalized log lines to a single file.
///
/// The file is opened in append mode for every line and released before the
/// next delivery is handled, so external rotation of the file is picked up on
/// the next append.
#[derive(Clone, Debug)]
pub struct LogWriter {
    path: PathBuf,
}

impl LogWriter {
    /// Creates a writer targeting `path`. The file is created on first append
    /// if it does not exist.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Destination log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sinks one delivery. Never fails from the caller's point of view; all
    /// failures are folded into the returned outcome.
    pub async fn handle(&self, delivery: &Delivery) -> WriteOutcome {
        let payload = match delivery.classify() {
            Ok(payload) => payload,
            Err(e) => return WriteOutcome::Failed(e),
        };

        let Some(record) = LogRecord::from_payload(payload, unix_timestamp()) else {
            return WriteOutcome::Dropped;
        };

        match self.append(&record).await {
            Ok(()) => WriteOutcome::Written,
            Err(e) => WriteOutcome::Failed(e),
        }
    }

    async fn append(&self, record: &LogRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| Error::Io("failed to open log file", e))?;

        file.write_all(record.to_line().as_bytes())
            .await
            .map_err(|e| Error::Io("failed to write log file", e))?;

        file.flush()
            .await
            .map_err(|e| Error::Io("failed to flush log file", e))?;

        Ok(())
    }
}
