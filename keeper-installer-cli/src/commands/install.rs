//! Install command - download and install Keeper with a progress bar.

use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use keeper_installer::config::{APP_DISPLAY_NAME, APP_VERSION};
use keeper_installer::observer::InstallEvent;
use keeper_installer::task::InstallTask;
use keeper_installer::{ArtifactInstaller, InstallOutcome};

use super::common::ensure_interactive;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the install command.
pub struct InstallArgs {
    pub yes: bool,
}

/// Run the install command.
pub fn run(runner: &CliRunner, args: InstallArgs) -> Result<(), CliError> {
    runner.log_startup("install");
    let target = runner.target();

    println!("{} v{}", style(APP_DISPLAY_NAME).bold(), APP_VERSION);
    println!("Source:      {}", target.source_url);
    println!("Destination: {}", target.artifact_path().display());
    if target.expected_digest().is_none() {
        println!(
            "{} no SHA-256 digest configured, the download will not be verified",
            style("warning:").yellow().bold()
        );
    }
    println!();

    if !args.yes {
        ensure_interactive()?;
        let prompt = if target.artifact_path().exists() {
            format!("{} is already installed. Reinstall?", APP_DISPLAY_NAME)
        } else {
            format!("Install {}?", APP_DISPLAY_NAME)
        };
        if !Confirm::new().with_prompt(prompt).default(true).interact()? {
            println!("Nothing to do.");
            return Ok(());
        }
    }

    let installer =
        ArtifactInstaller::with_timeout(runner.layout().clone(), runner.config().download.timeout_duration())?;
    let (handle, events) = InstallTask::spawn(installer, target)?;

    let cancel = handle.cancel_flag();
    ctrlc::set_handler(move || cancel.cancel())
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let mut outcome = None;
    for event in events.iter() {
        match event {
            InstallEvent::Phase(phase) => bar.set_message(phase.status_message()),
            InstallEvent::Progress(checkpoint) => {
                bar.set_position((checkpoint.fraction * 100.0).round() as u64)
            }
            InstallEvent::Warning(message) => {
                bar.println(format!("{} {}", style("warning:").yellow().bold(), message))
            }
            InstallEvent::Finished(result) => outcome = Some(result),
        }
    }

    let panicked = handle.join();
    match outcome.or(panicked) {
        Some(InstallOutcome::Success { final_path }) => {
            bar.finish_with_message("Done");
            println!();
            println!(
                "{} {} installed to {}",
                style("✓").green(),
                APP_DISPLAY_NAME,
                final_path.display()
            );
            println!("Run 'keeper-installer launch' to start it.");
            Ok(())
        }
        Some(InstallOutcome::Cancelled { phase }) => {
            bar.abandon_with_message("Cancelled");
            Err(CliError::Cancelled(phase))
        }
        Some(InstallOutcome::Failure { phase, cause }) => {
            bar.abandon_with_message("Failed");
            Err(CliError::InstallFailed { phase, cause })
        }
        None => {
            bar.abandon();
            Err(CliError::Config("install ended without a result".to_string()))
        }
    }
}
