//! Artifact installer.
//!
//! This module orchestrates one install run:
//! 1. Create the install directory
//! 2. Stream the artifact into a private temporary file
//! 3. Verify its SHA-256 digest (when one is configured)
//! 4. Rename it onto the final path and mark it executable
//! 5. Register menu and desktop shortcuts
//!
//! Every step is fail-fast except shortcut registration, which only warns.
//! The temporary file lives inside the install directory so the final rename
//! stays on one filesystem, and it is removed on every early exit.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;

use crate::checksum;
use crate::config::InstallTarget;
use crate::download::{DownloadError, HttpDownloader, ProgressRange};
use crate::error::{InstallerError, InstallerResult};
use crate::observer::InstallObserver;
use crate::paths::{InstallationLayout, Role};
use crate::shortcut::{platform_registrar, ShortcutLocations, ShortcutRegistrar};
use crate::state::{checkpoints, InstallOutcome, InstallPhase, InstallStateMachine};
use crate::task::CancelFlag;

/// Why a run stopped early.
enum Interrupt {
    Cancelled,
    Failed(InstallerError),
}

impl From<InstallerError> for Interrupt {
    fn from(err: InstallerError) -> Self {
        Interrupt::Failed(err)
    }
}

/// Downloads, verifies, and places the managed artifact.
pub struct ArtifactInstaller {
    downloader: HttpDownloader,
    registrar: Box<dyn ShortcutRegistrar>,
    layout: InstallationLayout,
}

impl ArtifactInstaller {
    /// Create an installer.
    ///
    /// # Arguments
    ///
    /// * `downloader` - HTTP client used for the artifact
    /// * `registrar` - Creates shortcuts after placement
    /// * `layout` - Where shortcut entries are written
    pub fn new(
        downloader: HttpDownloader,
        registrar: Box<dyn ShortcutRegistrar>,
        layout: InstallationLayout,
    ) -> Self {
        Self {
            downloader,
            registrar,
            layout,
        }
    }

    /// Create an installer with the platform registrar and the given timeout.
    pub fn with_timeout(layout: InstallationLayout, timeout: Duration) -> InstallerResult<Self> {
        let downloader = HttpDownloader::with_timeout(timeout)
            .map_err(|e| InstallerError::Config(e.to_string()))?;
        Ok(Self::new(downloader, platform_registrar(), layout))
    }

    /// Layout shortcuts are written into.
    pub fn layout(&self) -> &InstallationLayout {
        &self.layout
    }

    /// Install `target`, reporting progress to `observer`.
    ///
    /// `cancel` is honoured until the artifact is placed; after that the run
    /// always completes.
    pub fn install(
        &self,
        target: &InstallTarget,
        observer: &dyn InstallObserver,
        cancel: &CancelFlag,
    ) -> InstallOutcome {
        tracing::info!(url = %target.source_url, dest = %target.artifact_path().display(), "Starting install");

        let mut machine = InstallStateMachine::new(observer);
        match self.run(target, &mut machine, cancel) {
            Ok(final_path) => machine.succeed(final_path),
            Err(Interrupt::Cancelled) => machine.cancel(),
            Err(Interrupt::Failed(cause)) => machine.fail(cause),
        }
    }

    fn run(
        &self,
        target: &InstallTarget,
        machine: &mut InstallStateMachine<'_>,
        cancel: &CancelFlag,
    ) -> Result<PathBuf, Interrupt> {
        // Preparing
        machine.enter(InstallPhase::Preparing, checkpoints::PREPARING)?;
        let install_dir = &target.install_base_dir;
        fs::create_dir_all(install_dir).map_err(|e| InstallerError::DirectoryCreationFailed {
            path: install_dir.clone(),
            source: e,
        })?;
        machine.checkpoint(checkpoints::DOWNLOAD_START);

        // Downloading
        machine.enter(InstallPhase::Downloading, checkpoints::DOWNLOAD_START)?;
        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{}-", target.logical_name))
            .suffix(".part")
            .tempfile_in(install_dir)
            .map_err(InstallerError::TempFileFailed)?;
        let temp_path = temp.path().to_path_buf();

        let range = ProgressRange::new(checkpoints::DOWNLOAD_START, checkpoints::DOWNLOAD_END)?;
        let bytes = self
            .downloader
            .download(
                &target.source_url,
                temp.as_file_mut(),
                range,
                &mut |fraction| machine.checkpoint(fraction),
                cancel,
            )
            .map_err(|e| download_interrupt(e, &temp_path))?;

        temp.as_file()
            .sync_all()
            .map_err(|e| InstallerError::WriteFailed {
                path: temp_path.clone(),
                source: e,
            })?;
        tracing::debug!(bytes, path = %temp_path.display(), "Artifact downloaded");

        if cancel.is_cancelled() {
            return Err(Interrupt::Cancelled);
        }

        // Verifying
        match target.expected_digest() {
            Some(expected) => {
                machine.enter(InstallPhase::Verifying, checkpoints::VERIFYING)?;
                checksum::verify_checksum(&temp_path, expected).map_err(InstallerError::from)?;
                tracing::info!("Checksum verified");
            }
            None if target.checksum_required => {
                machine.enter(InstallPhase::Verifying, checkpoints::VERIFYING)?;
                return Err(InstallerError::ChecksumRequired.into());
            }
            None => {
                machine.warn("No checksum configured, skipping verification");
            }
        }

        if cancel.is_cancelled() {
            return Err(Interrupt::Cancelled);
        }

        // Placing
        machine.enter(InstallPhase::Placing, checkpoints::PLACING)?;
        let final_path = place(temp, target)?;

        // RegisteringShortcuts
        machine.enter(InstallPhase::RegisteringShortcuts, checkpoints::REGISTERING)?;
        let locations = ShortcutLocations {
            menu_entry: self.layout.resolve(Role::MenuEntry),
            desktop_icon: Some(self.layout.resolve(Role::DesktopIcon)),
        };
        if let Err(e) = self.registrar.register(&target.shortcut_spec(), &locations) {
            machine.warn(&format!("Could not create shortcuts: {}", e));
        }

        Ok(final_path)
    }
}

fn download_interrupt(err: DownloadError, temp_path: &Path) -> Interrupt {
    err.into_failure(temp_path)
        .map_or(Interrupt::Cancelled, Interrupt::Failed)
}

/// Rename the temporary file onto the artifact path and set its mode.
fn place(temp: NamedTempFile, target: &InstallTarget) -> InstallerResult<PathBuf> {
    let final_path = target.artifact_path();

    temp.persist(&final_path)
        .map_err(|e| InstallerError::PlacementFailed {
            path: final_path.clone(),
            source: e.error,
        })?;

    set_mode(&final_path, target.file_permissions).map_err(|e| {
        InstallerError::PermissionFailed {
            path: final_path.clone(),
            source: e,
        }
    })?;

    tracing::info!(path = %final_path.display(), mode = %format!("{:o}", target.file_permissions), "Artifact placed");
    Ok(final_path)
}

/// Set a Unix file mode. No-op elsewhere.
#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
