//! Keeper Installer CLI - Command-line interface
//!
//! Installs, launches, and uninstalls Keeper. On every start the binary
//! first copies itself to `~/QNE/local/keeper-installer` unless it is already
//! running from there.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;

use commands::config::ConfigCommands;
use commands::install::InstallArgs;
use commands::uninstall::UninstallArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "keeper-installer")]
#[command(version = keeper_installer::VERSION)]
#[command(about = "Install and manage the Keeper application", long_about = None)]
struct Cli {
    /// Root directory to install under (defaults to your home directory)
    #[arg(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,

    /// Do not copy this installer into the install directory
    #[arg(long, global = true)]
    no_self_install: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and install Keeper
    Install {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Remove Keeper and its shortcuts
    Uninstall {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Start the installed Keeper
    Launch,

    /// Show installation paths and state
    Status,

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let command = match cli.command {
        // Config commands only touch the config file.
        Some(Commands::Config { command }) => return commands::config::run(command),
        Some(command) => command,
        None => Commands::Status,
    };

    let runner = CliRunner::new(cli.home)?;
    if !cli.no_self_install {
        runner.bootstrap_self()?;
    }

    match command {
        Commands::Install { yes } => commands::install::run(&runner, InstallArgs { yes }),
        Commands::Uninstall { yes } => commands::uninstall::run(&runner, UninstallArgs { yes }),
        Commands::Launch => commands::launch::run(&runner),
        Commands::Status => commands::status::run(&runner),
        Commands::Config { command } => commands::config::run(command),
    }
}
