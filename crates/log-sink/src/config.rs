use std::path::{Path, PathBuf};

/// Directory log files land in when no absolute path is given.
pub const DEFAULT_LOG_DIR: &str = "/var/log/sdr";

/// File name used when no path argument is given.
pub const DEFAULT_LOG_FILE: &str = "sdr.log";

/// Resolves the effective log file path from an optional override.
///
/// Absolute overrides are used verbatim. Relative overrides are placed in
/// [`DEFAULT_LOG_DIR`]. No override selects [`DEFAULT_LOG_FILE`] there.
#[must_use]
pub fn resolve_log_path(path: Option<&str>) -> PathBuf {
    match path {
        Some(path) if Path::new(path).is_absolute() => PathBuf::from(path),
        Some(path) => Path::new(DEFAULT_LOG_DIR).join(path),
        None => Path::new(DEFAULT_LOG_DIR).join(DEFAULT_LOG_FILE),
    }
}
