//! Logging setup.
//!
//! Logs go to `keeper-installer.log` in the layout's log directory so they
//! never interfere with the terminal progress display. `RUST_LOG` overrides
//! the configured level.

use std::fs;
use std::path::{Path, PathBuf};

pub use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "keeper-installer.log";

/// Path of the log file in `log_dir`.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

/// Install the global subscriber.
///
/// Returns the guard that flushes the file writer; keep it alive until exit.
/// If the log file cannot be opened, logs go to stderr instead and `None` is
/// returned. Calling this twice leaves the first subscriber in place.
pub fn init_logging(log_dir: &Path, level: &str) -> Option<WorkerGuard> {
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{},keeper_installer={}", level, level)))
    };

    let appender = fs::create_dir_all(log_dir).map_err(|e| e.to_string()).and_then(|()| {
        RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(LOG_FILE_NAME)
            .build(log_dir)
            .map_err(|e| e.to_string())
    });

    match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter())
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .try_init()
                .ok();
            tracing::debug!(path = %log_file_path(log_dir).display(), "Logging initialized");
            Some(guard)
        }
        Err(reason) => {
            tracing_subscriber::registry()
                .with(filter())
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                .try_init()
                .ok();
            tracing::warn!(dir = %log_dir.display(), "Could not open log file, logging to stderr: {}", reason);
            None
        }
    }
}
