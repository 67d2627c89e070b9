//! Shortcut registration for installed executables.
//!
//! A [`ShortcutRegistrar`] turns a [`ShortcutSpec`] into platform launch
//! entries. The installer treats every registrar failure as a warning: a
//! missing menu entry never undoes a successful install.
//!
//! On Linux, [`DesktopEntryRegistrar`] writes freedesktop `.desktop` files:
//!
//! ```ini
//! [Desktop Entry]
//! Version=1.0
//! Type=Application
//! Name=Keeper
//! Exec=/home/user/QNE/local/keeper --no-sandbox
//! Icon=web-browser
//! Terminal=false
//! Categories=Network;WebBrowser;
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::error::InstallerError;
use crate::installer::set_mode;

/// Errors from a shortcut registrar.
#[derive(Debug, Error)]
pub enum ShortcutError {
    /// Creating the entry's directory failed.
    #[error("failed to create {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    /// Writing the entry failed.
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    /// The platform has no registrar.
    #[error("shortcuts are not supported on this platform")]
    Unsupported,
}

impl From<ShortcutError> for InstallerError {
    fn from(err: ShortcutError) -> Self {
        InstallerError::ShortcutRegistrationFailed(err.to_string())
    }
}

/// Structured description of a launchable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutSpec {
    /// Stable identifier, used as the entry's file stem.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Tooltip / description.
    pub comment: String,
    /// Executable to run.
    pub exec: PathBuf,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Icon name or path.
    pub icon: String,
    /// Menu categories.
    pub categories: Vec<String>,
    /// Search keywords.
    pub keywords: Vec<String>,
    /// Run in a terminal.
    pub terminal: bool,
}

impl ShortcutSpec {
    /// Create a spec with no comment, icon, categories, or arguments.
    pub fn new(id: impl Into<String>, name: impl Into<String>, exec: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            comment: String::new(),
            exec: exec.into(),
            args: Vec::new(),
            icon: String::new(),
            categories: Vec::new(),
            keywords: Vec::new(),
            terminal: false,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }
}

/// Where a registrar should place entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutLocations {
    /// Application menu entry path.
    pub menu_entry: PathBuf,
    /// Desktop icon path, if one should be created.
    pub desktop_icon: Option<PathBuf>,
}

/// Creates platform launch entries.
pub trait ShortcutRegistrar: Send + Sync {
    /// Create the entries for `spec`.
    ///
    /// # Returns
    ///
    /// Paths of the entries actually created.
    fn register(
        &self,
        spec: &ShortcutSpec,
        locations: &ShortcutLocations,
    ) -> Result<Vec<PathBuf>, ShortcutError>;

    /// Refresh the platform's entry index after entries were removed.
    fn refresh(&self, _menu_dir: &Path) {}
}

/// Registrar that creates nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRegistrar;

impl ShortcutRegistrar for NoopRegistrar {
    fn register(
        &self,
        _spec: &ShortcutSpec,
        _locations: &ShortcutLocations,
    ) -> Result<Vec<PathBuf>, ShortcutError> {
        Ok(Vec::new())
    }
}

/// Freedesktop `.desktop` file registrar.
#[derive(Debug, Clone)]
pub struct DesktopEntryRegistrar {
    run_helpers: bool,
}

impl Default for DesktopEntryRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopEntryRegistrar {
    /// Create a registrar that also runs `update-desktop-database` and `gio`.
    pub fn new() -> Self {
        Self { run_helpers: true }
    }

    /// Create a registrar that only writes files.
    pub fn without_helpers() -> Self {
        Self { run_helpers: false }
    }

    fn create_parent(path: &Path) -> Result<(), ShortcutError> {
        match path.parent() {
            Some(parent) => fs::create_dir_all(parent).map_err(|e| ShortcutError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            }),
            None => Ok(()),
        }
    }

    fn write_entry(path: &Path, content: &str, mode: u32) -> Result<(), ShortcutError> {
        fs::write(path, content).map_err(|e| ShortcutError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;

        set_mode(path, mode).map_err(|e| ShortcutError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn run_helper(&self, program: &str, args: &[&str]) {
        if !self.run_helpers {
            return;
        }
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() => tracing::debug!(program, "Desktop helper succeeded"),
            Ok(s) => tracing::debug!(program, code = ?s.code(), "Desktop helper failed"),
            Err(e) => tracing::debug!(program, error = %e, "Desktop helper unavailable"),
        }
    }
}

impl ShortcutRegistrar for DesktopEntryRegistrar {
    fn register(
        &self,
        spec: &ShortcutSpec,
        locations: &ShortcutLocations,
    ) -> Result<Vec<PathBuf>, ShortcutError> {
        let content = render_desktop_entry(spec);
        let mut created = Vec::new();

        Self::create_parent(&locations.menu_entry)?;
        Self::write_entry(&locations.menu_entry, &content, 0o644)?;
        created.push(locations.menu_entry.clone());
        tracing::info!(path = %locations.menu_entry.display(), "Created menu entry");

        // Only an existing desktop folder is used; it is never created.
        let icon_path = locations
            .desktop_icon
            .as_ref()
            .filter(|path| match path.parent() {
                Some(dir) if dir.is_dir() => true,
                _ => {
                    tracing::debug!(path = %path.display(), "No desktop folder, skipping desktop icon");
                    false
                }
            });

        if let Some(icon_path) = icon_path {
            // A read-only Desktop folder is common; the menu entry is enough.
            match Self::write_entry(icon_path, &content, 0o755) {
                Ok(()) => {
                    tracing::info!(path = %icon_path.display(), "Created desktop icon");
                    let path = icon_path.to_string_lossy();
                    self.run_helper("gio", &["set", &*path, "metadata::trusted", "true"]);
                    created.push(icon_path.clone());
                }
                Err(e) => tracing::warn!("Could not create desktop shortcut: {}", e),
            }
        }

        if let Some(menu_dir) = locations.menu_entry.parent() {
            self.refresh(menu_dir);
        }

        Ok(created)
    }

    fn refresh(&self, menu_dir: &Path) {
        let dir = menu_dir.to_string_lossy();
        self.run_helper("update-desktop-database", &[&*dir]);
    }
}

/// Registrar for the current platform.
pub fn platform_registrar() -> Box<dyn ShortcutRegistrar> {
    if cfg!(target_os = "linux") {
        Box::new(DesktopEntryRegistrar::new())
    } else {
        Box::new(NoopRegistrar)
    }
}

/// Render a freedesktop desktop entry.
pub fn render_desktop_entry(spec: &ShortcutSpec) -> String {
    let mut exec = quote_exec_arg(&spec.exec.to_string_lossy());
    for arg in &spec.args {
        exec.push(' ');
        exec.push_str(&quote_exec_arg(arg));
    }

    let mut lines = vec![
        "[Desktop Entry]".to_string(),
        "Version=1.0".to_string(),
        "Type=Application".to_string(),
        format!("Name={}", spec.name),
    ];
    if !spec.comment.is_empty() {
        lines.push(format!("Comment={}", spec.comment));
    }
    lines.push(format!("Exec={}", exec));
    if !spec.icon.is_empty() {
        lines.push(format!("Icon={}", spec.icon));
    }
    lines.push(format!("Terminal={}", spec.terminal));
    if !spec.categories.is_empty() {
        lines.push(format!("Categories={};", spec.categories.join(";")));
    }
    if !spec.keywords.is_empty() {
        lines.push(format!("Keywords={};", spec.keywords.join(";")));
    }
    lines.push("StartupNotify=true".to_string());

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// Quote an `Exec` argument if it contains reserved characters.
///
/// A literal `%` is always written as `%%`, quoted or not, since a lone `%`
/// starts a field code.
fn quote_exec_arg(arg: &str) -> String {
    const RESERVED: &[char] = &[
        ' ', '\t', '\n', '"', '\'', '\\', '>', '<', '~', '|', '&', ';', '$', '*', '?', '#', '(',
        ')', '`',
    ];
    if !arg.contains(RESERVED) {
        return arg.replace('%', "%%");
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        match c {
            '"' | '`' | '$' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '%' => quoted.push_str("%%"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
