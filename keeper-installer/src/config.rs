//! Install target definition and the optional user configuration file.
//!
//! The target is built from compile-time constants. A `config.ini` in the
//! user's config directory may override the download URL, the expected
//! digest, the checksum policy, the HTTP timeout, and the log level:
//!
//! ```ini
//! [artifact]
//! url = https://example.com/keeper-1.0.0.AppImage
//! sha256 = e3b0c442...
//! checksum_required = true
//!
//! [download]
//! timeout = 300
//!
//! [logging]
//! level = debug
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;

use crate::download::DEFAULT_TIMEOUT_SECS;
use crate::error::{InstallerError, InstallerResult};
use crate::paths::InstallationLayout;
use crate::shortcut::ShortcutSpec;

/// File name of the managed artifact.
pub const APP_NAME: &str = "keeper";

/// Display name of the managed artifact.
pub const APP_DISPLAY_NAME: &str = "Keeper";

/// Version of the managed artifact this installer ships.
pub const APP_VERSION: &str = "1.0.0";

/// File name of the installer binary (without platform suffix).
pub const INSTALLER_NAME: &str = "keeper-installer";

/// Display name of the installer.
pub const INSTALLER_DISPLAY_NAME: &str = "Keeper Installer";

/// Where the artifact is downloaded from.
pub const ARTIFACT_URL: &str = "https://qne-installers-cdn-cdn.b-cdn.net/keeper-1.0.0.AppImage";

/// Expected SHA-256 of the artifact. Empty means "not published".
pub const ARTIFACT_SHA256: &str = "";

/// Mode applied to installed executables.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Arguments the artifact needs when launched.
pub const LAUNCH_ARGS: &[&str] = &["--no-sandbox"];

/// Config file name inside the config directory.
const CONFIG_FILE_NAME: &str = "config.ini";

/// Everything needed to fetch and place one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    /// File name of the installed artifact.
    pub logical_name: String,
    /// Human-readable name used in shortcuts.
    pub display_name: String,
    /// Download URL.
    pub source_url: String,
    /// Expected SHA-256 (hex). `None` skips verification.
    pub expected_digest: Option<String>,
    /// Fail instead of skipping when no digest is configured.
    pub checksum_required: bool,
    /// Directory the artifact is placed in.
    pub install_base_dir: PathBuf,
    /// Unix mode applied after placement.
    pub file_permissions: u32,
    /// Shortcut comment.
    pub comment: String,
    /// Shortcut icon name.
    pub icon: String,
    /// Shortcut menu categories.
    pub categories: Vec<String>,
    /// Shortcut search keywords.
    pub keywords: Vec<String>,
    /// Arguments passed when launching the artifact.
    pub launch_args: Vec<String>,
}

impl InstallTarget {
    /// The Keeper artifact, installed into `layout`.
    pub fn keeper(layout: &InstallationLayout) -> Self {
        Self {
            logical_name: APP_NAME.to_string(),
            display_name: APP_DISPLAY_NAME.to_string(),
            source_url: ARTIFACT_URL.to_string(),
            expected_digest: non_empty(ARTIFACT_SHA256),
            checksum_required: false,
            install_base_dir: layout.install_dir(),
            file_permissions: EXECUTABLE_MODE,
            comment: "Chameleon Keeper - P2P Platform".to_string(),
            icon: "web-browser".to_string(),
            categories: vec!["Network".to_string(), "WebBrowser".to_string()],
            keywords: vec!["qne".to_string(), "browser".to_string(), "p2p".to_string()],
            launch_args: LAUNCH_ARGS.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Set the download URL.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    /// Set the expected digest. An empty string clears it.
    pub fn with_expected_digest(mut self, digest: impl AsRef<str>) -> Self {
        self.expected_digest = non_empty(digest.as_ref());
        self
    }

    /// Require a digest to be configured.
    pub fn with_checksum_required(mut self, required: bool) -> Self {
        self.checksum_required = required;
        self
    }

    /// Set the mode applied after placement.
    pub fn with_permissions(mut self, mode: u32) -> Self {
        self.file_permissions = mode;
        self
    }

    /// Expected digest, if one is configured.
    pub fn expected_digest(&self) -> Option<&str> {
        self.expected_digest.as_deref()
    }

    /// Final path of the installed artifact.
    pub fn artifact_path(&self) -> PathBuf {
        self.install_base_dir.join(&self.logical_name)
    }

    /// Shortcut description for the installed artifact.
    pub fn shortcut_spec(&self) -> ShortcutSpec {
        ShortcutSpec::new(&self.logical_name, &self.display_name, self.artifact_path())
            .with_comment(&self.comment)
            .with_icon(&self.icon)
            .with_args(self.launch_args.clone())
            .with_categories(self.categories.clone())
            .with_keywords(self.keywords.clone())
    }
}

/// `[artifact]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSettings {
    /// Download URL override.
    pub url: Option<String>,
    /// Expected SHA-256 override.
    pub sha256: Option<String>,
    /// Whether a digest is mandatory.
    pub checksum_required: bool,
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    /// HTTP timeout in seconds.
    pub timeout: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl DownloadSettings {
    /// Timeout as a duration.
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default tracing filter level.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Parsed `config.ini`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub artifact: ArtifactSettings,
    pub download: DownloadSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> InstallerResult<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> InstallerResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| {
            InstallerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|s| s.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }

        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> InstallerResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> InstallerResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| InstallerError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }

        ini.write_to_file(path)
            .map_err(|e| InstallerError::WriteFailed {
                path: path.to_path_buf(),
                source: e,
            })
    }

    /// Digest installs will be verified against, if any.
    pub fn effective_digest(&self) -> Option<String> {
        self.artifact
            .sha256
            .clone()
            .or_else(|| non_empty(ARTIFACT_SHA256))
    }

    /// Overlay these settings onto `target`.
    pub fn apply_to(&self, target: InstallTarget) -> InstallTarget {
        let mut target = target.with_checksum_required(self.artifact.checksum_required);
        if let Some(ref url) = self.artifact.url {
            target = target.with_source_url(url);
        }
        if let Some(ref sha256) = self.artifact.sha256 {
            target = target.with_expected_digest(sha256);
        }
        target
    }
}

/// Default location of `config.ini`.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(INSTALLER_NAME)
        .join(CONFIG_FILE_NAME)
}

/// A settable configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ArtifactUrl,
    ArtifactSha256,
    ArtifactChecksumRequired,
    DownloadTimeout,
    LoggingLevel,
}

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            Self::ArtifactUrl,
            Self::ArtifactSha256,
            Self::ArtifactChecksumRequired,
            Self::DownloadTimeout,
            Self::LoggingLevel,
        ]
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        match self {
            Self::ArtifactUrl | Self::ArtifactSha256 | Self::ArtifactChecksumRequired => {
                "artifact"
            }
            Self::DownloadTimeout => "download",
            Self::LoggingLevel => "logging",
        }
    }

    /// Key within the section.
    pub fn key_name(&self) -> &'static str {
        match self {
            Self::ArtifactUrl => "url",
            Self::ArtifactSha256 => "sha256",
            Self::ArtifactChecksumRequired => "checksum_required",
            Self::DownloadTimeout => "timeout",
            Self::LoggingLevel => "level",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as a string (empty when unset).
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            Self::ArtifactUrl => config.artifact.url.clone().unwrap_or_default(),
            Self::ArtifactSha256 => config.artifact.sha256.clone().unwrap_or_default(),
            Self::ArtifactChecksumRequired => config.artifact.checksum_required.to_string(),
            Self::DownloadTimeout => config.download.timeout.to_string(),
            Self::LoggingLevel => config.logging.level.clone(),
        }
    }

    /// Value compiled into the installer, used when the file does not set one.
    pub fn builtin_value(&self) -> String {
        match self {
            Self::ArtifactUrl => ARTIFACT_URL.to_string(),
            Self::ArtifactSha256 => ARTIFACT_SHA256.to_string(),
            _ => self.get(&ConfigFile::default()),
        }
    }

    /// Check if `config` replaces the built-in value.
    pub fn is_overridden(&self, config: &ConfigFile) -> bool {
        match self {
            Self::ArtifactUrl => config.artifact.url.is_some(),
            Self::ArtifactSha256 => config.artifact.sha256.is_some(),
            _ => self.get(config) != self.builtin_value(),
        }
    }

    /// Value in effect for an install.
    pub fn effective(&self, config: &ConfigFile) -> String {
        if self.is_overridden(config) {
            self.get(config)
        } else {
            self.builtin_value()
        }
    }

    /// Drop any override so the built-in value applies again.
    pub fn reset(&self, config: &mut ConfigFile) {
        let defaults = ConfigFile::default();
        match self {
            Self::ArtifactUrl => config.artifact.url = None,
            Self::ArtifactSha256 => config.artifact.sha256 = None,
            Self::ArtifactChecksumRequired => {
                config.artifact.checksum_required = defaults.artifact.checksum_required
            }
            Self::DownloadTimeout => config.download = defaults.download,
            Self::LoggingLevel => config.logging = defaults.logging,
        }
    }

    /// Parse and store `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> InstallerResult<()> {
        let value = value.trim();
        match self {
            Self::ArtifactUrl => config.artifact.url = non_empty(value),
            Self::ArtifactSha256 => {
                if !value.is_empty() && !is_sha256_hex(value) {
                    return Err(InstallerError::Config(format!(
                        "{} must be 64 hexadecimal characters",
                        self.name()
                    )));
                }
                config.artifact.sha256 = non_empty(&value.to_ascii_lowercase());
            }
            Self::ArtifactChecksumRequired => {
                config.artifact.checksum_required = parse_bool(value).ok_or_else(|| {
                    InstallerError::Config(format!("{} must be true or false", self.name()))
                })?;
            }
            Self::DownloadTimeout => {
                config.download.timeout = value
                    .parse::<u64>()
                    .ok()
                    .filter(|&t| t > 0)
                    .ok_or_else(|| {
                        InstallerError::Config(format!(
                            "{} must be a positive number of seconds",
                            self.name()
                        ))
                    })?;
            }
            Self::LoggingLevel => {
                if !["trace", "debug", "info", "warn", "error"]
                    .contains(&value.to_lowercase().as_str())
                {
                    return Err(InstallerError::Config(format!(
                        "{} must be one of trace, debug, info, warn, error",
                        self.name()
                    )));
                }
                config.logging.level = value.to_lowercase();
            }
        }
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s.trim())
            .ok_or_else(|| InstallerError::Config(format!("unknown configuration key '{}'", s)))
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DIGEST: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_keeper_target_defaults() {
        let layout = InstallationLayout::new("/home/alex");
        let target = InstallTarget::keeper(&layout);

        assert_eq!(target.logical_name, "keeper");
        assert_eq!(target.source_url, ARTIFACT_URL);
        assert_eq!(target.expected_digest(), None);
        assert!(!target.checksum_required);
        assert_eq!(target.file_permissions, 0o755);
        assert_eq!(target.artifact_path(), layout.artifact_path());
    }

    #[test]
    fn test_builder_pattern() {
        let layout = InstallationLayout::new("/home/alex");
        let target = InstallTarget::keeper(&layout)
            .with_source_url("http://localhost/keeper")
            .with_expected_digest(DIGEST)
            .with_checksum_required(true)
            .with_permissions(0o700);

        assert_eq!(target.source_url, "http://localhost/keeper");
        assert_eq!(target.expected_digest(), Some(DIGEST));
        assert!(target.checksum_required);
        assert_eq!(target.file_permissions, 0o700);

        let cleared = target.with_expected_digest("  ");
        assert_eq!(cleared.expected_digest(), None);
    }

    #[test]
    fn test_shortcut_spec_from_target() {
        let layout = InstallationLayout::new("/home/alex");
        let spec = InstallTarget::keeper(&layout).shortcut_spec();

        assert_eq!(spec.id, "keeper");
        assert_eq!(spec.name, "Keeper");
        assert_eq!(spec.exec, layout.artifact_path());
        assert_eq!(spec.args, vec!["--no-sandbox".to_string()]);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("missing.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.download.timeout, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.artifact.url = Some("http://mirror/keeper".to_string());
        config.artifact.sha256 = Some(DIGEST.to_string());
        config.artifact.checksum_required = true;
        config.download.timeout = 60;
        config.logging.level = "debug".to_string();
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        fs::write(&path, "[download]\ntimeout = soon\n").unwrap();

        assert!(matches!(
            ConfigFile::load_from(&path),
            Err(InstallerError::Config(_))
        ));
    }

    #[test]
    fn test_apply_to_target() {
        let layout = InstallationLayout::new("/home/alex");
        let mut config = ConfigFile::default();
        config.artifact.sha256 = Some(DIGEST.to_string());
        config.artifact.checksum_required = true;

        let target = config.apply_to(InstallTarget::keeper(&layout));
        assert_eq!(target.source_url, ARTIFACT_URL);
        assert_eq!(target.expected_digest(), Some(DIGEST));
        assert!(target.checksum_required);
    }

    #[test]
    fn test_config_key_parse() {
        let key: ConfigKey = "artifact.sha256".parse().unwrap();
        assert_eq!(key, ConfigKey::ArtifactSha256);
        assert_eq!(key.to_string(), "artifact.sha256");
        assert!("artifact.nope".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_config_key_set_validation() {
        let mut config = ConfigFile::default();

        assert!(ConfigKey::ArtifactSha256.set(&mut config, "xyz").is_err());
        assert!(ConfigKey::ArtifactChecksumRequired
            .set(&mut config, "maybe")
            .is_err());
        assert!(ConfigKey::DownloadTimeout.set(&mut config, "0").is_err());
        assert!(ConfigKey::LoggingLevel.set(&mut config, "loud").is_err());

        ConfigKey::ArtifactSha256
            .set(&mut config, &DIGEST.to_uppercase())
            .unwrap();
        assert_eq!(ConfigKey::ArtifactSha256.get(&config), DIGEST);

        ConfigKey::ArtifactChecksumRequired
            .set(&mut config, "yes")
            .unwrap();
        ConfigKey::LoggingLevel.set(&mut config, "WARN").unwrap();
        assert!(config.artifact.checksum_required);
        assert_eq!(ConfigKey::LoggingLevel.get(&config), "warn");
    }

    #[test]
    fn test_effective_values_and_reset() {
        let mut config = ConfigFile::default();
        let url = ConfigKey::ArtifactUrl;

        assert!(!url.is_overridden(&config));
        assert_eq!(url.effective(&config), ARTIFACT_URL);
        assert_eq!(config.effective_digest(), non_empty(ARTIFACT_SHA256));

        url.set(&mut config, "http://mirror/keeper").unwrap();
        ConfigKey::ArtifactSha256.set(&mut config, DIGEST).unwrap();
        ConfigKey::DownloadTimeout.set(&mut config, "60").unwrap();
        assert!(url.is_overridden(&config));
        assert_eq!(url.effective(&config), "http://mirror/keeper");
        assert_eq!(config.effective_digest().as_deref(), Some(DIGEST));
        assert!(ConfigKey::DownloadTimeout.is_overridden(&config));

        for key in ConfigKey::all() {
            key.reset(&mut config);
        }
        assert_eq!(config, ConfigFile::default());
        assert_eq!(
            ConfigKey::DownloadTimeout.effective(&config),
            DEFAULT_TIMEOUT_SECS.to_string()
        );
    }
}
