//! Running an install off the UI thread.
//!
//! [`InstallTask::spawn`] moves an [`ArtifactInstaller`] onto a worker thread
//! and returns a handle plus a channel of [`InstallEvent`]s. The UI drains the
//! channel to drive its progress display; the last event is always
//! [`InstallEvent::Finished`].
//!
//! Only one install may run against a given layout at a time. Nothing here
//! enforces that; callers must not spawn a second task while one is running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;

use crate::config::InstallTarget;
use crate::error::InstallerError;
use crate::installer::ArtifactInstaller;
use crate::observer::{ChannelObserver, InstallEvent};
use crate::state::{InstallOutcome, InstallPhase};

/// Shared cancellation flag.
///
/// Clones share the same flag. Raising it is honoured at the next chunk
/// boundary of a download or before the artifact is placed.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check if the flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Spawns installs on a worker thread.
pub struct InstallTask;

impl InstallTask {
    /// Start installing `target` on a new thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread could not be spawned.
    pub fn spawn(
        installer: ArtifactInstaller,
        target: InstallTarget,
    ) -> Result<(InstallHandle, Receiver<InstallEvent>), InstallerError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let cancel = CancelFlag::new();
        let worker_cancel = cancel.clone();

        let thread = thread::Builder::new()
            .name("keeper-install".to_string())
            .spawn(move || {
                let observer = ChannelObserver::new(tx);
                let outcome = installer.install(&target, &observer, &worker_cancel);
                observer.finish(outcome);
            })
            .map_err(|e| InstallerError::Config(format!("failed to spawn install thread: {}", e)))?;

        Ok((InstallHandle { thread, cancel }, rx))
    }
}

/// Handle to a running install.
pub struct InstallHandle {
    thread: JoinHandle<()>,
    cancel: CancelFlag,
}

impl InstallHandle {
    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Flag shared with the worker, e.g. for a Ctrl-C handler.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Check if the worker has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the worker to exit.
    ///
    /// A normal run delivers its outcome as the final event on the channel
    /// and this returns `None`. If the worker panicked before sending it,
    /// the panic is returned as a failure.
    pub fn join(self) -> Option<InstallOutcome> {
        match self.thread.join() {
            Ok(()) => None,
            Err(_) => Some(InstallOutcome::Failure {
                phase: InstallPhase::Idle,
                cause: InstallerError::Config("install thread panicked".to_string()),
            }),
        }
    }
}
