//! Removal of installed files.
//!
//! Uninstall is fail-soft: every file is attempted even if an earlier one
//! could not be removed, and the result lists exactly what happened to each.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::InstallerError;
use crate::paths::{InstallationLayout, Role};
use crate::shortcut::ShortcutRegistrar;

/// Files removed by an uninstall, in removal order.
///
/// The installer binary and its own menu entry are left in place so the
/// installer remains usable.
pub const UNINSTALL_ROLES: [Role; 3] = [Role::ManagedArtifact, Role::MenuEntry, Role::DesktopIcon];

/// A file that could not be removed.
#[derive(Debug)]
pub struct RemovalFailure {
    /// Which file.
    pub role: Role,
    /// Why it is still there.
    pub cause: InstallerError,
}

/// Result of an uninstall.
#[derive(Debug, Default)]
pub struct UninstallReport {
    /// Roles whose file was removed by this run.
    pub removed: BTreeSet<Role>,
    /// Roles whose file did not exist to begin with.
    pub absent: BTreeSet<Role>,
    /// Roles whose file could not be removed.
    pub failed: Vec<RemovalFailure>,
}

impl UninstallReport {
    /// Check if no file was left behind.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Removes the managed artifact and its shortcuts.
pub struct UninstallCoordinator<'a> {
    layout: &'a InstallationLayout,
    registrar: &'a dyn ShortcutRegistrar,
}

impl<'a> UninstallCoordinator<'a> {
    /// Create a coordinator for `layout`.
    pub fn new(layout: &'a InstallationLayout, registrar: &'a dyn ShortcutRegistrar) -> Self {
        Self { layout, registrar }
    }

    /// Check if the managed artifact exists.
    pub fn is_installed(&self) -> bool {
        self.layout.artifact_path().is_file()
    }

    /// Roles whose file currently exists.
    pub fn present_roles(&self) -> Vec<Role> {
        UNINSTALL_ROLES
            .into_iter()
            .filter(|&role| self.layout.resolve(role).exists())
            .collect()
    }

    /// Remove every installed file, then prune empty directories.
    ///
    /// Never fails as a whole; see [`UninstallReport`].
    pub fn uninstall(&self) -> UninstallReport {
        let mut report = UninstallReport::default();

        for role in UNINSTALL_ROLES {
            let path = self.layout.resolve(role);
            match remove_file_if_exists(&path) {
                Ok(true) => {
                    tracing::info!(role = %role, path = %path.display(), "Removed");
                    report.removed.insert(role);
                }
                Ok(false) => {
                    tracing::debug!(role = %role, path = %path.display(), "Already absent");
                    report.absent.insert(role);
                }
                Err(e) => {
                    tracing::warn!(role = %role, path = %path.display(), error = %e, "Failed to remove");
                    report.failed.push(RemovalFailure {
                        role,
                        cause: InstallerError::RemovalFailed {
                            path: path.clone(),
                            source: e,
                        },
                    });
                }
            }
        }

        // Inner first so the outer one can become empty.
        remove_dir_if_empty(&self.layout.install_dir());
        remove_dir_if_empty(&self.layout.vendor_dir());

        self.registrar.refresh(&self.layout.applications_dir());

        report
    }
}

/// Remove a file. `Ok(false)` if it did not exist.
fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Remove a directory only if it is empty. Errors are ignored.
fn remove_dir_if_empty(path: &Path) {
    // remove_dir refuses non-empty directories.
    if fs::remove_dir(path).is_ok() {
        tracing::debug!(path = %path.display(), "Removed empty directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcut::NoopRegistrar;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_uninstall_nothing_installed() {
        let temp = TempDir::new().unwrap();
        let layout = InstallationLayout::new(temp.path());
        let report = UninstallCoordinator::new(&layout, &NoopRegistrar).uninstall();

        assert!(report.is_clean());
        assert!(report.removed.is_empty());
        assert_eq!(report.absent.len(), UNINSTALL_ROLES.len());
    }

    #[test]
    fn test_uninstall_removes_files_and_empty_dirs() {
        let temp = TempDir::new().unwrap();
        let layout = InstallationLayout::new(temp.path());
        for role in UNINSTALL_ROLES {
            touch(&layout.resolve(role));
        }

        let coordinator = UninstallCoordinator::new(&layout, &NoopRegistrar);
        assert!(coordinator.is_installed());
        assert_eq!(coordinator.present_roles(), UNINSTALL_ROLES.to_vec());

        let report = coordinator.uninstall();

        assert!(report.is_clean());
        assert_eq!(report.removed.len(), UNINSTALL_ROLES.len());
        assert!(!coordinator.is_installed());
        assert!(coordinator.present_roles().is_empty());
        for role in UNINSTALL_ROLES {
            assert!(!layout.resolve(role).exists(), "{} still exists", role);
        }
        assert!(!layout.install_dir().exists());
        assert!(!layout.vendor_dir().exists());
    }

    #[test]
    fn test_uninstall_keeps_installer_and_its_directory() {
        let temp = TempDir::new().unwrap();
        let layout = InstallationLayout::new(temp.path());
        touch(&layout.artifact_path());
        touch(&layout.installer_path());

        let report = UninstallCoordinator::new(&layout, &NoopRegistrar).uninstall();

        assert!(report.is_clean());
        assert!(!layout.artifact_path().exists());
        assert!(layout.installer_path().exists());
        assert!(layout.install_dir().exists());
    }

    #[test]
    fn test_uninstall_continues_after_failure() {
        let temp = TempDir::new().unwrap();
        let layout = InstallationLayout::new(temp.path());
        // A non-empty directory where the artifact should be cannot be removed as a file.
        touch(&layout.artifact_path().join("nested"));
        touch(&layout.resolve(Role::MenuEntry));

        let report = UninstallCoordinator::new(&layout, &NoopRegistrar).uninstall();

        assert!(!report.is_clean());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].role, Role::ManagedArtifact);
        assert!(report.removed.contains(&Role::MenuEntry));
        assert!(report.absent.contains(&Role::DesktopIcon));
        assert!(!layout.resolve(Role::MenuEntry).exists());
    }
}
