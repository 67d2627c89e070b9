//! Keeper Installer - self-installing installer for the Keeper AppImage
//!
//! This library downloads the Keeper artifact over HTTPS, verifies its
//! SHA-256 digest, places it under `~/QNE/local`, and registers desktop
//! shortcuts. It also copies the installer itself next to the artifact, and
//! can uninstall or launch what it installed.
//!
//! Presentation is not part of this crate: progress and warnings are
//! reported through [`observer::InstallObserver`], and a terminal front end
//! lives in `keeper-installer-cli`.

pub mod checksum;
pub mod config;
pub mod download;
pub mod error;
pub mod installer;
pub mod launcher;
pub mod logging;
pub mod observer;
pub mod paths;
pub mod self_install;
pub mod shortcut;
pub mod state;
pub mod task;
pub mod uninstall;

pub use config::InstallTarget;
pub use error::{InstallerError, InstallerResult};
pub use installer::ArtifactInstaller;
pub use paths::{InstallationLayout, Role};
pub use state::{InstallOutcome, InstallPhase};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
