//! Shared setup for CLI commands.
//!
//! Resolves the installation layout, loads the config file, starts file
//! logging (outside the directories uninstall prunes), and runs the
//! self-install bootstrap.

use std::path::PathBuf;

use console::style;
use keeper_installer::config::{ConfigFile, InstallTarget};
use keeper_installer::logging::{self, WorkerGuard};
use keeper_installer::self_install::{SelfInstallOutcome, SelfInstaller};
use keeper_installer::shortcut::platform_registrar;
use keeper_installer::{InstallationLayout, InstallerError};

use crate::error::CliError;

/// Context every command runs in.
pub struct CliRunner {
    layout: InstallationLayout,
    config: ConfigFile,
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Build the runner.
    ///
    /// `home` overrides the root directory; otherwise the user's home is used.
    pub fn new(home: Option<PathBuf>) -> Result<Self, CliError> {
        let layout = match home {
            Some(root) => InstallationLayout::new(root),
            None => InstallationLayout::from_home().ok_or(InstallerError::NoHomeDirectory)?,
        };

        let config = match ConfigFile::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{} {}", style("warning:").yellow().bold(), e);
                ConfigFile::default()
            }
        };

        let log_guard = logging::init_logging(&layout.log_dir(), &config.logging.level);

        Ok(Self {
            layout,
            config,
            _log_guard: log_guard,
        })
    }

    /// Installation layout.
    pub fn layout(&self) -> &InstallationLayout {
        &self.layout
    }

    /// Loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// The Keeper target with config overrides applied.
    pub fn target(&self) -> InstallTarget {
        self.config.apply_to(InstallTarget::keeper(&self.layout))
    }

    /// Log the start of a command.
    pub fn log_startup(&self, command: &str) {
        tracing::info!(
            command,
            version = keeper_installer::VERSION,
            root = %self.layout.root().display(),
            "keeper-installer starting"
        );
    }

    /// Copy the running binary into the install directory if needed.
    ///
    /// # Errors
    ///
    /// Fails if the running executable cannot be located or copied; the
    /// requested command must not run in that case.
    pub fn bootstrap_self(&self) -> Result<(), CliError> {
        let current_exe = std::env::current_exe().map_err(|e| {
            tracing::error!("Could not locate running executable: {}", e);
            CliError::SelfInstall(format!("could not locate running executable: {}", e))
        })?;

        let registrar = platform_registrar();
        let outcome = SelfInstaller::new(&self.layout, registrar.as_ref())
            .bootstrap(&current_exe)
            .map_err(|e| {
                tracing::error!("Self-install failed: {}", e);
                CliError::SelfInstall(e.to_string())
            })?;

        if let SelfInstallOutcome::Installed {
            path,
            shortcut_warning,
        } = outcome
        {
            println!(
                "{} Installer copied to {}",
                style("✓").green(),
                path.display()
            );
            if let Some(warning) = shortcut_warning {
                println!("{} {}", style("warning:").yellow().bold(), warning);
            }
        }
        Ok(())
    }
}
