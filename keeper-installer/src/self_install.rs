//! Self-installation of the installer binary.
//!
//! On first run the installer copies itself into the install directory and
//! registers a menu entry for that copy, so it can later be used to launch
//! or uninstall Keeper. Running the installed copy is a no-op.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{INSTALLER_DISPLAY_NAME, INSTALLER_NAME};
use crate::error::{InstallerError, InstallerResult};
use crate::installer::set_mode;
use crate::paths::{InstallationLayout, Role};
use crate::shortcut::{ShortcutLocations, ShortcutRegistrar, ShortcutSpec};

/// Mode of the installed installer binary.
const INSTALLER_MODE: u32 = 0o755;

/// Result of [`SelfInstaller::bootstrap`].
#[derive(Debug)]
pub enum SelfInstallOutcome {
    /// The running binary already is the installed copy.
    AlreadyInstalled { path: PathBuf },
    /// The running binary was copied to `path`.
    ///
    /// `shortcut_warning` is set if the menu entry could not be created.
    Installed {
        path: PathBuf,
        shortcut_warning: Option<String>,
    },
}

impl SelfInstallOutcome {
    /// Path of the installed installer binary.
    pub fn path(&self) -> &Path {
        match self {
            Self::AlreadyInstalled { path } | Self::Installed { path, .. } => path,
        }
    }
}

/// Copies the running installer into the install directory.
pub struct SelfInstaller<'a> {
    layout: &'a InstallationLayout,
    registrar: &'a dyn ShortcutRegistrar,
}

impl<'a> SelfInstaller<'a> {
    /// Create a self-installer for `layout`.
    pub fn new(layout: &'a InstallationLayout, registrar: &'a dyn ShortcutRegistrar) -> Self {
        Self { layout, registrar }
    }

    /// Check if `current_exe` is the installed copy.
    ///
    /// Both paths are canonicalized, so symlinks to the installed copy also
    /// count. A missing installed copy is never a match.
    pub fn is_installed(&self, current_exe: &Path) -> bool {
        let installed = match fs::canonicalize(self.layout.installer_path()) {
            Ok(path) => path,
            Err(_) => return false,
        };
        match fs::canonicalize(current_exe) {
            Ok(current) => current == installed,
            Err(_) => false,
        }
    }

    /// Install `current_exe` unless it already is the installed copy.
    ///
    /// # Errors
    ///
    /// Fails if the install directory cannot be created, the binary cannot be
    /// copied, or its mode cannot be set. A failed menu entry is reported in
    /// the outcome instead.
    pub fn bootstrap(&self, current_exe: &Path) -> InstallerResult<SelfInstallOutcome> {
        let target = self.layout.installer_path();

        if self.is_installed(current_exe) {
            tracing::debug!(path = %target.display(), "Installer already installed");
            return Ok(SelfInstallOutcome::AlreadyInstalled { path: target });
        }

        let install_dir = self.layout.install_dir();
        fs::create_dir_all(&install_dir).map_err(|e| InstallerError::DirectoryCreationFailed {
            path: install_dir.clone(),
            source: e,
        })?;

        copy_binary(current_exe, &target, &install_dir)?;

        set_mode(&target, INSTALLER_MODE).map_err(|e| InstallerError::PermissionFailed {
            path: target.clone(),
            source: e,
        })?;
        tracing::info!(from = %current_exe.display(), to = %target.display(), "Installer installed");

        let spec = ShortcutSpec::new(INSTALLER_NAME, INSTALLER_DISPLAY_NAME, target.clone())
            .with_comment("Install and manage Keeper")
            .with_icon("system-software-install")
            .with_categories(vec![
                "Network".to_string(),
                "WebBrowser".to_string(),
                "Utility".to_string(),
            ]);
        let locations = ShortcutLocations {
            menu_entry: self.layout.resolve(Role::InstallerMenuEntry),
            desktop_icon: None,
        };

        let shortcut_warning = match self.registrar.register(&spec, &locations) {
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Could not create installer menu entry: {}", e);
                Some(e.to_string())
            }
        };

        Ok(SelfInstallOutcome::Installed {
            path: target,
            shortcut_warning,
        })
    }
}

/// Copy through a temporary file in `dir`, then rename onto `to`.
fn copy_binary(from: &Path, to: &Path, dir: &Path) -> InstallerResult<()> {
    let copy_err = |source: io::Error| InstallerError::CopyFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{}-", INSTALLER_NAME))
        .tempfile_in(dir)
        .map_err(InstallerError::TempFileFailed)?;

    let mut source = File::open(from).map_err(copy_err)?;
    io::copy(&mut source, temp.as_file_mut()).map_err(copy_err)?;
    temp.as_file().sync_all().map_err(copy_err)?;

    temp.persist(to).map_err(|e| copy_err(e.error))?;
    Ok(())
}
