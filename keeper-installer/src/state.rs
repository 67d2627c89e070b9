//! Install state machine.
//!
//! An install run moves strictly forward through these phases:
//!
//! ```text
//! Idle -> Preparing -> Downloading -> Verifying -> Placing
//!      -> RegisteringShortcuts -> Done
//! ```
//!
//! `Verifying` is skipped when no digest is configured. There is no retry in
//! place and no backward transition; a failure in any phase ends the run.

use std::fmt;
use std::path::PathBuf;

use crate::error::{InstallerError, InstallerResult};
use crate::observer::InstallObserver;

/// A named step within an install run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstallPhase {
    /// Nothing has happened yet.
    Idle,
    /// Creating the install directory.
    Preparing,
    /// Streaming the artifact into a temporary file.
    Downloading,
    /// Checking the downloaded file against the expected digest.
    Verifying,
    /// Moving the verified file into place and marking it executable.
    Placing,
    /// Creating menu and desktop entries.
    RegisteringShortcuts,
    /// The run is over.
    Done,
}

impl InstallPhase {
    /// Get a human-readable name for the phase.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Preparing => "Preparing",
            Self::Downloading => "Downloading",
            Self::Verifying => "Verifying",
            Self::Placing => "Placing",
            Self::RegisteringShortcuts => "Registering shortcuts",
            Self::Done => "Done",
        }
    }

    /// Status line shown while the phase runs.
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting to start",
            Self::Preparing => "Creating installation directory...",
            Self::Downloading => "Downloading Keeper...",
            Self::Verifying => "Verifying download...",
            Self::Placing => "Installing Keeper...",
            Self::RegisteringShortcuts => "Creating shortcuts...",
            Self::Done => "Installation complete",
        }
    }

    /// Whether cancellation is still honoured in this phase.
    ///
    /// Once the artifact is being placed it is committed.
    pub fn is_cancellable(&self) -> bool {
        *self < Self::Placing
    }
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Overall progress at a point in an install run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressCheckpoint {
    /// Phase the run is in.
    pub phase: InstallPhase,
    /// Overall completion in `[0, 1]`.
    pub fraction: f64,
}

/// Fixed progress marks for each phase.
pub mod checkpoints {
    /// Entering `Preparing`.
    pub const PREPARING: f64 = 0.0;
    /// Install directory exists; download starts here.
    pub const DOWNLOAD_START: f64 = 0.10;
    /// Download finished.
    pub const DOWNLOAD_END: f64 = 0.80;
    /// Entering `Verifying`.
    pub const VERIFYING: f64 = 0.85;
    /// Entering `Placing`.
    pub const PLACING: f64 = 0.90;
    /// Entering `RegisteringShortcuts`.
    pub const REGISTERING: f64 = 0.95;
    /// Run complete.
    pub const DONE: f64 = 1.0;
}

/// Terminal result of an install run.
#[derive(Debug)]
pub enum InstallOutcome {
    /// The artifact is installed at `final_path`.
    Success { final_path: PathBuf },
    /// A fatal error stopped the run during `phase`.
    Failure {
        phase: InstallPhase,
        cause: InstallerError,
    },
    /// The caller cancelled the run during `phase`.
    Cancelled { phase: InstallPhase },
}

impl InstallOutcome {
    /// Check if the run succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Check if the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Installed path, if the run succeeded.
    pub fn final_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Success { final_path } => Some(final_path),
            _ => None,
        }
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { final_path } => {
                write!(f, "installed to {}", final_path.display())
            }
            Self::Failure { phase, cause } => write!(f, "{} failed: {}", phase, cause),
            Self::Cancelled { phase } => write!(f, "cancelled during {}", phase),
        }
    }
}

/// Tracks the current phase and progress of one install run.
///
/// Every transition and checkpoint is forwarded to the observer. Progress is
/// clamped so the observer never sees it go backwards.
pub struct InstallStateMachine<'a> {
    observer: &'a dyn InstallObserver,
    phase: InstallPhase,
    fraction: f64,
    history: Vec<InstallPhase>,
    finished: bool,
}

impl<'a> InstallStateMachine<'a> {
    /// Create a machine in the `Idle` phase.
    pub fn new(observer: &'a dyn InstallObserver) -> Self {
        Self {
            observer,
            phase: InstallPhase::Idle,
            fraction: 0.0,
            history: vec![InstallPhase::Idle],
            finished: false,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> InstallPhase {
        self.phase
    }

    /// Highest progress reported so far.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Phases entered so far, in order, starting with `Idle`.
    pub fn history(&self) -> &[InstallPhase] {
        &self.history
    }

    /// Move to `next` and report a checkpoint at `fraction`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidTransition`] if `next` is not strictly
    /// after the current phase.
    pub fn enter(&mut self, next: InstallPhase, fraction: f64) -> InstallerResult<()> {
        if next <= self.phase {
            return Err(InstallerError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::info!(from = %self.phase, to = %next, "Install phase");
        self.phase = next;
        self.history.push(next);
        self.observer.on_phase(next);
        self.checkpoint(fraction);
        Ok(())
    }

    /// Report progress within the current phase.
    ///
    /// Values below the last reported fraction are raised to it; values
    /// outside `[0, 1]` are clamped.
    pub fn checkpoint(&mut self, fraction: f64) {
        let fraction = if fraction.is_nan() {
            self.fraction
        } else {
            fraction.clamp(self.fraction, 1.0)
        };
        self.fraction = fraction;
        self.observer.on_progress(ProgressCheckpoint {
            phase: self.phase,
            fraction,
        });
    }

    /// Forward a non-fatal problem to the observer.
    pub fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
        self.observer.on_warning(message);
    }

    /// End the run with a success.
    pub fn succeed(&mut self, final_path: PathBuf) -> InstallOutcome {
        if self.phase < InstallPhase::Done {
            // Done always follows the current phase, so this cannot fail.
            let _ = self.enter(InstallPhase::Done, checkpoints::DONE);
        }
        self.finished = true;
        tracing::info!(path = %final_path.display(), "Install complete");
        InstallOutcome::Success { final_path }
    }

    /// End the run with a failure in the current phase.
    pub fn fail(&mut self, cause: InstallerError) -> InstallOutcome {
        let phase = self.phase;
        self.finish();
        tracing::error!(phase = %phase, error = %cause, "Install failed");
        InstallOutcome::Failure { phase, cause }
    }

    /// End the run as cancelled in the current phase.
    pub fn cancel(&mut self) -> InstallOutcome {
        let phase = self.phase;
        self.finish();
        tracing::info!(phase = %phase, "Install cancelled");
        InstallOutcome::Cancelled { phase }
    }

    /// Whether a terminal outcome has been produced.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        if self.phase < InstallPhase::Done {
            self.history.push(InstallPhase::Done);
            self.phase = InstallPhase::Done;
            self.observer.on_phase(InstallPhase::Done);
        }
        self.finished = true;
    }
}
