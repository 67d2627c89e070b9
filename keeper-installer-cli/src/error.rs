//! CLI error types.

use std::io;

use keeper_installer::{InstallPhase, InstallerError};
use thiserror::Error;

/// Exit code for a command the user interrupted.
pub const EXIT_CANCELLED: i32 = 130;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Installer(#[from] InstallerError),

    #[error("{phase} failed: {cause}")]
    InstallFailed {
        phase: InstallPhase,
        cause: InstallerError,
    },

    #[error("Installation cancelled during {0}")]
    Cancelled(InstallPhase),

    #[error("Failed to install keeper-installer: {0}")]
    SelfInstall(String),

    #[error("Uninstall incomplete: {0} item(s) could not be removed")]
    UninstallIncomplete(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Cancelled(_) => EXIT_CANCELLED,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Cancelled(InstallPhase::Downloading).exit_code(), 130);
        assert_eq!(CliError::Config("bad".to_string()).exit_code(), 1);
        assert_eq!(CliError::UninstallIncomplete(2).exit_code(), 1);
        assert_eq!(CliError::SelfInstall("disk full".to_string()).exit_code(), 1);
    }

    #[test]
    fn test_install_failed_display() {
        let err = CliError::InstallFailed {
            phase: InstallPhase::Downloading,
            cause: InstallerError::HttpStatusFailure(404),
        };
        assert_eq!(
            err.to_string(),
            "Downloading failed: download failed with HTTP status 404"
        );
    }
}
