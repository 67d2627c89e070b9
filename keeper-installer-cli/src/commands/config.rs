//! Config command - inspect and override the download settings.
//!
//! Every key has a value compiled into the installer. The config file only
//! records overrides, so `list` and `get` show which one is in effect and
//! `unset` goes back to the built-in value.

use std::fmt;

use clap::Subcommand;
use console::style;
use keeper_installer::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value in effect for a key
    Get {
        /// Key as section.key (e.g. artifact.sha256)
        key: String,
    },

    /// Override a key in the config file
    Set {
        /// Key as section.key (e.g. artifact.sha256)
        key: String,

        /// New value
        value: String,
    },

    /// Remove an override so the built-in value applies again
    Unset {
        /// Key as section.key (e.g. artifact.url)
        key: String,
    },

    /// Show every key with its effective and built-in value
    List,

    /// Show the configuration file path
    Path,
}

/// Whether installs will check the downloaded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Downloads are checked against this digest.
    Digest(String),
    /// No digest; installs proceed with a warning.
    Skipped,
    /// No digest but one is required; installs will fail.
    Blocked,
}

impl Verification {
    pub fn of(config: &ConfigFile) -> Self {
        match config.effective_digest() {
            Some(digest) => Self::Digest(digest),
            None if config.artifact.checksum_required => Self::Blocked,
            None => Self::Skipped,
        }
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digest(digest) => write!(f, "downloads are verified against {}", digest),
            Self::Skipped => f.write_str("no digest set, downloads are not verified"),
            Self::Blocked => {
                f.write_str("no digest set but checksum_required is on, installs will fail")
            }
        }
    }
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::Unset { key } => run_unset(&key),
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => run_path(),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        let known: Vec<String> = ConfigKey::all().iter().map(ConfigKey::name).collect();
        CliError::Config(format!(
            "Unknown configuration key '{}' (known keys: {})",
            key,
            known.join(", ")
        ))
    })
}

fn load() -> Result<ConfigFile, CliError> {
    ConfigFile::load().map_err(|e| CliError::Config(e.to_string()))
}

/// Text shown for a key's effective value.
fn render_value(key: ConfigKey, config: &ConfigFile) -> String {
    let value = key.effective(config);
    match key {
        ConfigKey::ArtifactSha256 if value.is_empty() => {
            format!("(not set, {})", Verification::of(config))
        }
        _ if value.is_empty() => "(not set)".to_string(),
        _ => value,
    }
}

fn run_get(key: &str) -> Result<(), CliError> {
    let key = parse_key(key)?;
    let config = load()?;
    println!("{}", render_value(key, &config));
    Ok(())
}

fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let key = parse_key(key)?;
    let mut config = load()?;
    key.set(&mut config, value)
        .map_err(|e| CliError::Config(e.to_string()))?;
    config.save()?;

    // Echo what was stored, which may be normalized.
    println!("Set {} = {}", key, render_value(key, &config));
    if Verification::of(&config) == Verification::Blocked {
        println!(
            "{} {}",
            style("warning:").yellow().bold(),
            Verification::Blocked
        );
    }
    Ok(())
}

fn run_unset(key: &str) -> Result<(), CliError> {
    let key = parse_key(key)?;
    let mut config = load()?;
    if !key.is_overridden(&config) {
        println!("{} is not overridden", key);
        return Ok(());
    }
    key.reset(&mut config);
    config.save()?;
    println!("Unset {}, now {}", key, render_value(key, &config));
    Ok(())
}

fn run_list() -> Result<(), CliError> {
    let config = load()?;

    let mut section = "";
    for &key in ConfigKey::all() {
        if key.section() != section {
            if !section.is_empty() {
                println!();
            }
            section = key.section();
            println!("[{}]", section);
        }

        let value = render_value(key, &config);
        if key.is_overridden(&config) {
            let builtin = key.builtin_value();
            let builtin = if builtin.is_empty() { "(none)".to_string() } else { builtin };
            println!(
                "  {} = {}  {}",
                key.key_name(),
                value,
                style(format!("(built-in: {})", builtin)).dim()
            );
        } else {
            println!("  {} = {}  {}", key.key_name(), value, style("(built-in)").dim());
        }
    }

    println!();
    let verification = Verification::of(&config);
    match verification {
        Verification::Digest(_) => println!("{}", verification),
        _ => println!("{} {}", style("warning:").yellow().bold(), verification),
    }
    Ok(())
}

fn run_path() -> Result<(), CliError> {
    let path = config_file_path();
    if path.exists() {
        println!("{}", path.display());
    } else {
        println!("{} {}", path.display(), style("(not created yet)").dim());
    }
    Ok(())
}
