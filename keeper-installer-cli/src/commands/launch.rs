//! Launch command - start the installed Keeper.

use console::style;
use keeper_installer::config::APP_DISPLAY_NAME;
use keeper_installer::launcher::{launch_installed, DetachedSpawner};
use keeper_installer::InstallerError;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the launch command.
pub fn run(runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("launch");

    match launch_installed(&runner.target(), &DetachedSpawner) {
        Ok(pid) => {
            println!("{} Started {} (pid {})", style("✓").green(), APP_DISPLAY_NAME, pid);
            Ok(())
        }
        Err(InstallerError::NotInstalled(path)) => Err(CliError::Config(format!(
            "{} is not installed at {}. Run 'keeper-installer install' first.",
            APP_DISPLAY_NAME,
            path.display()
        ))),
        Err(e) => Err(e.into()),
    }
}
