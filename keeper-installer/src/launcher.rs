//! Starting the installed artifact.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::InstallTarget;
use crate::error::{InstallerError, InstallerResult};

/// Starts processes.
pub trait ProcessSpawner {
    /// Start `program` with `args` and return its process id.
    fn spawn(&self, program: &Path, args: &[String]) -> InstallerResult<u32>;
}

/// Spawns a detached child with all standard streams closed.
///
/// The child is not waited on; it keeps running after the installer exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedSpawner;

impl ProcessSpawner for DetachedSpawner {
    fn spawn(&self, program: &Path, args: &[String]) -> InstallerResult<u32> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| InstallerError::LaunchFailed {
                path: program.to_path_buf(),
                source: e,
            })?;
        Ok(child.id())
    }
}

/// Launch the installed artifact described by `target`.
///
/// # Errors
///
/// Returns [`InstallerError::NotInstalled`] if the artifact is missing, or
/// [`InstallerError::LaunchFailed`] if it could not be started.
pub fn launch_installed(target: &InstallTarget, spawner: &dyn ProcessSpawner) -> InstallerResult<u32> {
    let path = target.artifact_path();
    if !path.is_file() {
        return Err(InstallerError::NotInstalled(path));
    }

    let pid = spawner.spawn(&path, &target.launch_args)?;
    tracing::info!(path = %path.display(), pid, "Launched application");
    Ok(pid)
}
