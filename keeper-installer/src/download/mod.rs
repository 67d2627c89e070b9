//! Progressive HTTP download of the managed artifact.
//!
//! This module provides:
//! - Single-request streaming downloads (`http`)
//! - Mapping of byte counts onto a slice of overall progress (`progress`)
//!
//! There is no resume or retry: a failed download fails the
//! install, and the next attempt starts from scratch.
//!
//! # Example
//!
//! ```ignore
//! use keeper_installer::download::{HttpDownloader, ProgressRange};
//! use keeper_installer::task::CancelFlag;
//!
//! let downloader = HttpDownloader::new()?;
//! let mut file = std::fs::File::create("/tmp/keeper")?;
//! downloader.download(
//!     "https://example.com/keeper.AppImage",
//!     &mut file,
//!     ProgressRange::new(0.1, 0.8)?,
//!     &mut |fraction| println!("{:.0}%", fraction * 100.0),
//!     &CancelFlag::new(),
//! )?;
//! ```

mod http;
mod progress;

pub use http::{DownloadError, HttpDownloader, DEFAULT_TIMEOUT_SECS};
pub use progress::ProgressRange;
