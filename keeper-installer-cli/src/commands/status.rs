//! Status command - show where everything lives and what is installed.

use console::style;
use keeper_installer::config::{config_file_path, APP_DISPLAY_NAME};
use keeper_installer::logging::log_file_path;
use keeper_installer::Role;

use super::common::presence;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the status command.
pub fn run(runner: &CliRunner) -> Result<(), CliError> {
    let layout = runner.layout();
    let target = runner.target();

    println!("{} Installer v{}", APP_DISPLAY_NAME, keeper_installer::VERSION);
    println!("==========================");
    println!();

    for role in Role::ALL {
        let path = layout.resolve(role);
        println!("  {:<22} {:<8} {}", role.id(), presence(path.exists()), path.display());
    }
    println!();

    let config_path = config_file_path();
    println!("Config file: {} ({})", config_path.display(), presence(config_path.exists()));
    println!("Log file:    {}", log_file_path(&layout.log_dir()).display());
    println!("Source:      {}", target.source_url);
    match target.expected_digest() {
        Some(digest) => println!("SHA-256:     {}", digest),
        None => println!("SHA-256:     {}", style("(not set, downloads are not verified)").yellow()),
    }

    Ok(())
}
