//! SHA-256 checksum calculation for download verification.
//!
//! Files are streamed through the hasher in fixed-size chunks, so verifying a
//! large artifact never loads it into memory.
//!
//! Deciding *whether* to verify is not this module's concern. When no digest
//! is configured the installer skips verification explicitly and reports a
//! warning; see [`ArtifactInstaller`](crate::installer::ArtifactInstaller).

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::error::InstallerError;

/// Buffer size for reading files during checksum calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Why a file failed verification.
#[derive(Debug, Error)]
pub enum ChecksumError {
    /// The digest of the file differs from the expected digest.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },

    /// The file could not be opened or read.
    #[error("failed to read {}: {source}", path.display())]
    Unreadable { path: PathBuf, source: io::Error },
}

impl From<ChecksumError> for InstallerError {
    fn from(err: ChecksumError) -> Self {
        match err {
            ChecksumError::Mismatch { expected, actual } => {
                InstallerError::ChecksumMismatch { expected, actual }
            }
            ChecksumError::Unreadable { path, source } => {
                InstallerError::ChecksumUnreadable { path, source }
            }
        }
    }
}

/// Calculate the SHA-256 checksum of a file.
///
/// # Returns
///
/// The lowercase hexadecimal SHA-256 hash of the file contents.
///
/// # Errors
///
/// Returns [`ChecksumError::Unreadable`] if the file cannot be read.
pub fn calculate_file_checksum(path: &Path) -> Result<String, ChecksumError> {
    let unreadable = |source| ChecksumError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(unreadable)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(unreadable(e)),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify that a file matches an expected SHA-256 checksum.
///
/// The comparison ignores case and surrounding whitespace in `expected`.
pub fn verify_checksum(path: &Path, expected: &str) -> Result<(), ChecksumError> {
    let actual = calculate_file_checksum(path)?;
    let expected = expected.trim();

    if !actual.eq_ignore_ascii_case(expected) {
        return Err(ChecksumError::Mismatch {
            expected: expected.to_string(),
            actual,
        });
    }

    tracing::debug!(path = %path.display(), "Checksum verified");
    Ok(())
}
