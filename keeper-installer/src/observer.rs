//! Observer interface for install progress.
//!
//! The installer never talks to a UI directly. It reports phases, progress,
//! and warnings to an [`InstallObserver`]; the presentation layer decides how
//! to render them.

use std::sync::Mutex;

use crossbeam_channel::Sender;

use crate::state::{InstallOutcome, InstallPhase, ProgressCheckpoint};

/// Receives events from a running install.
///
/// Implementations must not block for long; events are delivered on the
/// install thread.
pub trait InstallObserver {
    /// A new phase has started.
    fn on_phase(&self, phase: InstallPhase);

    /// Overall progress changed.
    fn on_progress(&self, checkpoint: ProgressCheckpoint);

    /// Something non-fatal went wrong.
    fn on_warning(&self, message: &str);
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl InstallObserver for NullObserver {
    fn on_phase(&self, _phase: InstallPhase) {}
    fn on_progress(&self, _checkpoint: ProgressCheckpoint) {}
    fn on_warning(&self, _message: &str) {}
}

/// Events sent from the install thread to the UI.
#[derive(Debug)]
pub enum InstallEvent {
    /// A new phase has started.
    Phase(InstallPhase),
    /// Overall progress changed.
    Progress(ProgressCheckpoint),
    /// A non-fatal problem.
    Warning(String),
    /// The run is over. Always the last event.
    Finished(InstallOutcome),
}

/// Observer that forwards events over a channel.
///
/// Send errors are ignored: if the receiver is gone there is nobody left to
/// tell.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: Sender<InstallEvent>,
}

impl ChannelObserver {
    /// Create an observer that sends into `tx`.
    pub fn new(tx: Sender<InstallEvent>) -> Self {
        Self { tx }
    }

    /// Send the terminal event.
    pub fn finish(&self, outcome: InstallOutcome) {
        let _ = self.tx.send(InstallEvent::Finished(outcome));
    }
}

impl InstallObserver for ChannelObserver {
    fn on_phase(&self, phase: InstallPhase) {
        let _ = self.tx.send(InstallEvent::Phase(phase));
    }

    fn on_progress(&self, checkpoint: ProgressCheckpoint) {
        let _ = self.tx.send(InstallEvent::Progress(checkpoint));
    }

    fn on_warning(&self, message: &str) {
        let _ = self.tx.send(InstallEvent::Warning(message.to_string()));
    }
}

/// Observer that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    phases: Mutex<Vec<InstallPhase>>,
    checkpoints: Mutex<Vec<ProgressCheckpoint>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Phases seen so far.
    pub fn phases(&self) -> Vec<InstallPhase> {
        lock(&self.phases).clone()
    }

    /// Checkpoints seen so far.
    pub fn checkpoints(&self) -> Vec<ProgressCheckpoint> {
        lock(&self.checkpoints).clone()
    }

    /// Progress fractions seen so far.
    pub fn fractions(&self) -> Vec<f64> {
        lock(&self.checkpoints).iter().map(|c| c.fraction).collect()
    }

    /// Warnings seen so far.
    pub fn warnings(&self) -> Vec<String> {
        lock(&self.warnings).clone()
    }
}

impl InstallObserver for RecordingObserver {
    fn on_phase(&self, phase: InstallPhase) {
        lock(&self.phases).push(phase);
    }

    fn on_progress(&self, checkpoint: ProgressCheckpoint) {
        lock(&self.checkpoints).push(checkpoint);
    }

    fn on_warning(&self, message: &str) {
        lock(&self.warnings).push(message.to_string());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
