//! Installation layout: where every installed file lives.
//!
//! All paths are pure functions of a root directory (normally the user's
//! home). Nothing here touches the filesystem, so the same root always yields
//! the same paths.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{APP_NAME, INSTALLER_NAME};

/// Directory under the root that holds installed binaries.
const INSTALL_SUBDIR: [&str; 2] = ["QNE", "local"];

/// Directory under the root that holds freedesktop menu entries.
const APPLICATIONS_SUBDIR: [&str; 3] = [".local", "share", "applications"];

/// Directory under the root that holds desktop icons.
const DESKTOP_SUBDIR: &str = "Desktop";

/// Directory under the root that holds installer logs, outside the tree
/// uninstall prunes.
const LOG_SUBDIR: [&str; 4] = [".local", "state", "keeper-installer", "logs"];

/// Extension used for launchable entries.
const SHORTCUT_EXTENSION: &str = "desktop";

/// A file the installer owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// The installer's own binary after self-installation.
    InstallerBinary,
    /// The downloaded application.
    ManagedArtifact,
    /// Application menu entry for the managed artifact.
    MenuEntry,
    /// Desktop icon for the managed artifact.
    DesktopIcon,
    /// Application menu entry for the installer itself.
    InstallerMenuEntry,
}

impl Role {
    /// Every role, in a stable order.
    pub const ALL: [Role; 5] = [
        Role::InstallerBinary,
        Role::ManagedArtifact,
        Role::MenuEntry,
        Role::DesktopIcon,
        Role::InstallerMenuEntry,
    ];

    /// Short identifier used in reports and logs.
    pub fn id(&self) -> &'static str {
        match self {
            Self::InstallerBinary => "installer-binary",
            Self::ManagedArtifact => "managed-artifact",
            Self::MenuEntry => "menu-entry",
            Self::DesktopIcon => "desktop-icon",
            Self::InstallerMenuEntry => "installer-menu-entry",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Paths of everything the installer creates, derived from a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationLayout {
    root: PathBuf,
}

impl InstallationLayout {
    /// Create a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a layout rooted at the current user's home directory.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn from_home() -> Option<Self> {
        dirs::home_dir().map(Self::new)
    }

    /// The root directory this layout is derived from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a role to its absolute path.
    pub fn resolve(&self, role: Role) -> PathBuf {
        match role {
            Role::InstallerBinary => self.install_dir().join(installer_file_name()),
            Role::ManagedArtifact => self.install_dir().join(APP_NAME),
            Role::MenuEntry => self.applications_dir().join(shortcut_file_name(APP_NAME)),
            Role::DesktopIcon => self.desktop_dir().join(shortcut_file_name(APP_NAME)),
            Role::InstallerMenuEntry => self
                .applications_dir()
                .join(shortcut_file_name(INSTALLER_NAME)),
        }
    }

    /// Directory that holds the installer and the managed artifact.
    pub fn install_dir(&self) -> PathBuf {
        INSTALL_SUBDIR
            .iter()
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Top-level vendor directory (parent of [`install_dir`](Self::install_dir)).
    pub fn vendor_dir(&self) -> PathBuf {
        self.root.join(INSTALL_SUBDIR[0])
    }

    /// Freedesktop applications directory.
    pub fn applications_dir(&self) -> PathBuf {
        APPLICATIONS_SUBDIR
            .iter()
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// User desktop directory.
    pub fn desktop_dir(&self) -> PathBuf {
        self.root.join(DESKTOP_SUBDIR)
    }

    /// Directory for installer log files.
    pub fn log_dir(&self) -> PathBuf {
        LOG_SUBDIR
            .iter()
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Path of the installer binary.
    pub fn installer_path(&self) -> PathBuf {
        self.resolve(Role::InstallerBinary)
    }

    /// Path of the managed artifact.
    pub fn artifact_path(&self) -> PathBuf {
        self.resolve(Role::ManagedArtifact)
    }
}

/// File name of the installer binary, with the platform executable suffix.
fn installer_file_name() -> String {
    format!("{}{}", INSTALLER_NAME, std::env::consts::EXE_SUFFIX)
}

fn shortcut_file_name(name: &str) -> String {
    format!("{}.{}", name, SHORTCUT_EXTENSION)
}
