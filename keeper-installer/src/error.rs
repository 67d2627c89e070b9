//! Error types for installer operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::state::InstallPhase;

/// Result type for installer operations.
pub type InstallerResult<T> = Result<T, InstallerError>;

/// Errors that can occur while installing, uninstalling, or launching.
///
/// Shortcut registration and individual removals are non-fatal: they are
/// reported as warnings or collected into an [`UninstallReport`] rather than
/// aborting the enclosing operation.
///
/// [`UninstallReport`]: crate::uninstall::UninstallReport
#[derive(Debug, Error)]
pub enum InstallerError {
    /// Failed to create the install directory tree.
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// Failed to create the private temporary download file.
    #[error("failed to create temporary file: {0}")]
    TempFileFailed(#[source] io::Error),

    /// Transport-level failure (DNS, connection, TLS, read error).
    #[error("network failure downloading {url}: {reason}")]
    NetworkFailure { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("download failed with HTTP status {0}")]
    HttpStatusFailure(u16),

    /// Failed to write downloaded bytes to disk.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Downloaded content does not match the expected digest.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// The file to verify could not be read.
    #[error("failed to read {} for verification: {source}", path.display())]
    ChecksumUnreadable { path: PathBuf, source: io::Error },

    /// Checksum verification is required but no digest is configured.
    #[error("checksum verification is required but no expected digest is configured")]
    ChecksumRequired,

    /// Failed to move the verified file to its final location.
    #[error("failed to place artifact at {}: {source}", path.display())]
    PlacementFailed { path: PathBuf, source: io::Error },

    /// Failed to set file permissions.
    #[error("failed to set permissions on {}: {source}", path.display())]
    PermissionFailed { path: PathBuf, source: io::Error },

    /// Failed to copy the running installer binary.
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// Shortcut registration failed (non-fatal).
    #[error("shortcut registration failed: {0}")]
    ShortcutRegistrationFailed(String),

    /// Removing an installed file failed (non-fatal, aggregated).
    #[error("failed to remove {}: {source}", path.display())]
    RemovalFailed { path: PathBuf, source: io::Error },

    /// The state machine was asked to move backwards or repeat a phase.
    #[error("invalid phase transition from {from} to {to}")]
    InvalidTransition { from: InstallPhase, to: InstallPhase },

    /// The managed artifact is not installed.
    #[error("not installed: {}", .0.display())]
    NotInstalled(PathBuf),

    /// Failed to start the installed program.
    #[error("failed to launch {}: {source}", path.display())]
    LaunchFailed { path: PathBuf, source: io::Error },

    /// The user's home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDirectory,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}
