//! Uninstall command - remove Keeper and its shortcuts.

use console::style;
use dialoguer::Confirm;
use keeper_installer::config::APP_DISPLAY_NAME;
use keeper_installer::shortcut::platform_registrar;
use keeper_installer::uninstall::{UninstallCoordinator, UNINSTALL_ROLES};

use super::common::ensure_interactive;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the uninstall command.
pub struct UninstallArgs {
    pub yes: bool,
}

/// Run the uninstall command.
pub fn run(runner: &CliRunner, args: UninstallArgs) -> Result<(), CliError> {
    runner.log_startup("uninstall");
    let layout = runner.layout();
    let registrar = platform_registrar();
    let coordinator = UninstallCoordinator::new(layout, registrar.as_ref());

    if !coordinator.is_installed() {
        let leftovers = coordinator.present_roles();
        if leftovers.is_empty() {
            println!("{} is not installed.", APP_DISPLAY_NAME);
            return Ok(());
        }
        println!(
            "{} is not installed, but {} shortcut file(s) remain.",
            APP_DISPLAY_NAME,
            leftovers.len()
        );
    }

    if !args.yes {
        ensure_interactive()?;
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove {} and its shortcuts from {}?",
                APP_DISPLAY_NAME,
                layout.root().display()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Uninstall cancelled.");
            return Ok(());
        }
    }

    let report = coordinator.uninstall();

    for role in UNINSTALL_ROLES {
        if report.removed.contains(&role) {
            println!("  {} {}", style("✓").green(), layout.resolve(role).display());
        }
    }
    for failure in &report.failed {
        println!("  {} {}", style("✗").red(), failure.cause);
    }
    println!();

    if report.is_clean() {
        println!("{} has been uninstalled.", APP_DISPLAY_NAME);
        Ok(())
    } else {
        Err(CliError::UninstallIncomplete(report.failed.len()))
    }
}
