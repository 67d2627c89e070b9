//! HTTP downloader that streams a response body to a writer.
//!
//! The body is read in fixed-size chunks and each chunk is written before
//! the next one is requested, so memory use does not depend on file size.

use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

use super::progress::{ProgressRange, ProgressScaler};
use crate::error::InstallerError;
use crate::task::CancelFlag;

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Chunk size for reading/writing during downloads (32KB).
const CHUNK_SIZE: usize = 32 * 1024;

/// Why a download failed.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The server returned a non-success status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The request or the body transfer failed.
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    /// Writing to the destination failed.
    #[error("write error: {0}")]
    Write(#[source] io::Error),

    /// The HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The cancellation flag was raised between chunks.
    #[error("download cancelled")]
    Cancelled,
}

impl DownloadError {
    /// The install failure this error stands for, or `None` for a cancellation.
    ///
    /// `dest` is the file the body was being written to.
    pub fn into_failure(self, dest: &Path) -> Option<InstallerError> {
        match self {
            DownloadError::HttpStatus(code) => Some(InstallerError::HttpStatusFailure(code)),
            DownloadError::Network { url, reason } => {
                Some(InstallerError::NetworkFailure { url, reason })
            }
            DownloadError::Write(source) => Some(InstallerError::WriteFailed {
                path: dest.to_path_buf(),
                source,
            }),
            DownloadError::Client(reason) => Some(InstallerError::Config(reason)),
            DownloadError::Cancelled => None,
        }
    }
}

/// Blocking HTTP downloader with progress reporting.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    timeout: Duration,
}

impl HttpDownloader {
    /// Create a downloader with the default timeout.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a downloader with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("keeper-installer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DownloadError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Download `url` into `dest`, reporting progress within `range`.
    ///
    /// `on_progress` receives values inside `range` that never decrease. If
    /// the server does not announce a length, only `range.start()` is
    /// reported until the body ends, then `range.end()`.
    ///
    /// `cancel` is checked before every chunk read.
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    ///
    /// # Errors
    ///
    /// A non-2xx status fails before anything is written. There are no
    /// retries.
    pub fn download<W: Write + ?Sized>(
        &self,
        url: &str,
        dest: &mut W,
        range: ProgressRange,
        on_progress: &mut dyn FnMut(f64),
        cancel: &CancelFlag,
    ) -> Result<u64, DownloadError> {
        if cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        tracing::debug!(url, "Starting download");
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| DownloadError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "Download rejected");
            return Err(DownloadError::HttpStatus(status.as_u16()));
        }

        let total = response.content_length();
        let mut scaler = ProgressScaler::new(range, total);
        on_progress(scaler.initial());

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut downloaded = 0u64;

        loop {
            if cancel.is_cancelled() {
                tracing::info!(url, downloaded, "Download cancelled");
                return Err(DownloadError::Cancelled);
            }

            let bytes_read = match response.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(DownloadError::Network {
                        url: url.to_string(),
                        reason: format!("read error: {}", e),
                    })
                }
            };

            dest.write_all(&buffer[..bytes_read])
                .map_err(DownloadError::Write)?;
            downloaded += bytes_read as u64;

            if let Some(fraction) = scaler.advance(downloaded) {
                on_progress(fraction);
            }
        }

        dest.flush().map_err(DownloadError::Write)?;
        on_progress(scaler.complete());

        tracing::debug!(url, downloaded, ?total, "Download finished");
        Ok(downloaded)
    }
}
