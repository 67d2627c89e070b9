//! Integration tests for the install, self-install, and uninstall flows.
//!
//! These tests run the real installer against a local mock HTTP server and a
//! temporary home directory.
//!
//! Run with: `cargo test --test install_flow`

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tempfile::TempDir;

use keeper_installer::download::HttpDownloader;
use keeper_installer::observer::{InstallEvent, InstallObserver, RecordingObserver};
use keeper_installer::self_install::{SelfInstallOutcome, SelfInstaller};
use keeper_installer::shortcut::{
    DesktopEntryRegistrar, NoopRegistrar, ShortcutError, ShortcutLocations, ShortcutRegistrar,
    ShortcutSpec,
};
use keeper_installer::state::{checkpoints, ProgressCheckpoint};
use keeper_installer::task::{CancelFlag, InstallTask};
use keeper_installer::uninstall::UninstallCoordinator;
use keeper_installer::{
    ArtifactInstaller, InstallOutcome, InstallPhase, InstallTarget, InstallationLayout,
    InstallerError, Role,
};

// ============================================================================
// Helper Functions
// ============================================================================

const ARTIFACT_PATH: &str = "/keeper-1.0.0.AppImage";

/// Registrar that always fails.
struct FailingRegistrar;

impl ShortcutRegistrar for FailingRegistrar {
    fn register(
        &self,
        _spec: &ShortcutSpec,
        _locations: &ShortcutLocations,
    ) -> Result<Vec<PathBuf>, ShortcutError> {
        Err(ShortcutError::Unsupported)
    }
}

/// Observer that raises the cancel flag once the download has made progress.
struct CancelMidDownload {
    cancel: CancelFlag,
}

impl InstallObserver for CancelMidDownload {
    fn on_phase(&self, _phase: InstallPhase) {}

    fn on_progress(&self, checkpoint: ProgressCheckpoint) {
        if checkpoint.phase == InstallPhase::Downloading
            && checkpoint.fraction > checkpoints::DOWNLOAD_START
        {
            self.cancel.cancel();
        }
    }

    fn on_warning(&self, _message: &str) {}
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn artifact_body() -> Vec<u8> {
    (0..1000u32).map(|i| (i % 251) as u8).collect()
}

fn installer(layout: &InstallationLayout, registrar: Box<dyn ShortcutRegistrar>) -> ArtifactInstaller {
    let downloader = HttpDownloader::with_timeout(Duration::from_secs(10)).unwrap();
    ArtifactInstaller::new(downloader, registrar, layout.clone())
}

fn target(layout: &InstallationLayout, server: &mockito::Server) -> InstallTarget {
    InstallTarget::keeper(layout).with_source_url(format!("{}{}", server.url(), ARTIFACT_PATH))
}

fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .map(|entries| entries.map(|e| e.unwrap().path()).collect())
        .unwrap_or_default()
}

// ============================================================================
// Install
// ============================================================================

#[test]
fn test_install_success_end_to_end() {
    let body = artifact_body();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_body(&body)
        .create();

    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    let target = target(&layout, &server).with_expected_digest(sha256_hex(&body));
    let observer = RecordingObserver::new();

    let outcome = installer(&layout, Box::new(NoopRegistrar)).install(
        &target,
        &observer,
        &CancelFlag::new(),
    );

    mock.assert();
    assert!(outcome.is_success(), "unexpected outcome: {}", outcome);
    assert_eq!(outcome.final_path(), Some(&layout.artifact_path()));
    assert_eq!(fs::read(layout.artifact_path()).unwrap(), body);

    assert_eq!(
        observer.phases(),
        vec![
            InstallPhase::Preparing,
            InstallPhase::Downloading,
            InstallPhase::Verifying,
            InstallPhase::Placing,
            InstallPhase::RegisteringShortcuts,
            InstallPhase::Done,
        ]
    );

    let fractions = observer.fractions();
    assert_eq!(fractions.first(), Some(&0.0));
    assert_eq!(fractions.last(), Some(&1.0));
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert!(fractions.contains(&0.85));
    assert!(fractions.contains(&0.9));
    assert!(observer.warnings().is_empty());

    // Only the artifact is left in the install directory.
    assert_eq!(dir_entries(&layout.install_dir()), vec![layout.artifact_path()]);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(layout.artifact_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

#[test]
fn test_install_checksum_mismatch_leaves_nothing_behind() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_body(artifact_body())
        .create();

    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    let target = target(&layout, &server).with_expected_digest("0".repeat(64));
    let observer = RecordingObserver::new();

    let outcome = installer(&layout, Box::new(NoopRegistrar)).install(
        &target,
        &observer,
        &CancelFlag::new(),
    );

    match outcome {
        InstallOutcome::Failure { phase, cause } => {
            assert_eq!(phase, InstallPhase::Verifying);
            assert!(matches!(cause, InstallerError::ChecksumMismatch { .. }));
        }
        other => panic!("Expected Failure, got {:?}", other),
    }
    assert!(!layout.artifact_path().exists());
    assert!(dir_entries(&layout.install_dir()).is_empty());
    assert!(!observer.phases().contains(&InstallPhase::Placing));
}

#[test]
fn test_install_http_error_fails_in_downloading() {
    let mut server = mockito::Server::new();
    server.mock("GET", ARTIFACT_PATH).with_status(404).create();

    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    let target = target(&layout, &server);

    let outcome = installer(&layout, Box::new(NoopRegistrar)).install(
        &target,
        &RecordingObserver::new(),
        &CancelFlag::new(),
    );

    match outcome {
        InstallOutcome::Failure { phase, cause } => {
            assert_eq!(phase, InstallPhase::Downloading);
            assert!(matches!(cause, InstallerError::HttpStatusFailure(404)));
        }
        other => panic!("Expected Failure, got {:?}", other),
    }
    assert!(dir_entries(&layout.install_dir()).is_empty());
}

#[test]
fn test_install_without_digest_warns_and_skips_verifying() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_body(artifact_body())
        .create();

    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    let target = target(&layout, &server);
    assert!(target.expected_digest().is_none());
    let observer = RecordingObserver::new();

    let outcome = installer(&layout, Box::new(NoopRegistrar)).install(
        &target,
        &observer,
        &CancelFlag::new(),
    );

    assert!(outcome.is_success());
    assert!(!observer.phases().contains(&InstallPhase::Verifying));
    assert_eq!(observer.warnings().len(), 1);
    assert!(observer.warnings()[0].contains("No checksum configured"));
}

#[test]
fn test_install_checksum_required_without_digest_fails() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_body(artifact_body())
        .create();

    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    let target = target(&layout, &server).with_checksum_required(true);

    let outcome = installer(&layout, Box::new(NoopRegistrar)).install(
        &target,
        &RecordingObserver::new(),
        &CancelFlag::new(),
    );

    assert!(matches!(
        outcome,
        InstallOutcome::Failure {
            phase: InstallPhase::Verifying,
            cause: InstallerError::ChecksumRequired
        }
    ));
    assert!(!layout.artifact_path().exists());
}

#[test]
fn test_install_unknown_length_reports_only_range_bounds() {
    let body = artifact_body();
    let chunked = body.clone();
    let mut server = mockito::Server::new();
    server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_chunked_body(move |w| w.write_all(&chunked))
        .create();

    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    let target = target(&layout, &server).with_expected_digest(sha256_hex(&body));
    let observer = RecordingObserver::new();

    let outcome = installer(&layout, Box::new(NoopRegistrar)).install(
        &target,
        &observer,
        &CancelFlag::new(),
    );

    assert!(outcome.is_success());
    let downloading: Vec<f64> = observer
        .checkpoints()
        .into_iter()
        .filter(|c| c.phase == InstallPhase::Downloading)
        .map(|c| c.fraction)
        .collect();
    assert!(downloading.iter().all(|&f| f == 0.1 || f == 0.8));
    assert_eq!(downloading.last(), Some(&0.8));
}

#[test]
fn test_install_shortcut_failure_is_only_a_warning() {
    let body = artifact_body();
    let mut server = mockito::Server::new();
    server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_body(&body)
        .create();

    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    let target = target(&layout, &server).with_expected_digest(sha256_hex(&body));
    let observer = RecordingObserver::new();

    let outcome = installer(&layout, Box::new(FailingRegistrar)).install(
        &target,
        &observer,
        &CancelFlag::new(),
    );

    assert!(outcome.is_success());
    assert_eq!(observer.warnings().len(), 1);
    assert!(observer.warnings()[0].contains("shortcuts"));
}

#[test]
fn test_install_writes_desktop_entries() {
    let body = artifact_body();
    let mut server = mockito::Server::new();
    server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_body(&body)
        .create();

    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    fs::create_dir_all(layout.desktop_dir()).unwrap();
    let target = target(&layout, &server).with_expected_digest(sha256_hex(&body));

    let outcome = installer(&layout, Box::new(DesktopEntryRegistrar::without_helpers())).install(
        &target,
        &RecordingObserver::new(),
        &CancelFlag::new(),
    );

    assert!(outcome.is_success());
    let entry = fs::read_to_string(layout.resolve(Role::MenuEntry)).unwrap();
    assert!(entry.contains(&format!("Exec={} --no-sandbox", layout.artifact_path().display())));
    assert!(layout.resolve(Role::DesktopIcon).exists());
}

#[test]
fn test_install_cancelled_before_download() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_body(artifact_body())
        .expect(0)
        .create();

    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    let target = target(&layout, &server);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let outcome = installer(&layout, Box::new(NoopRegistrar)).install(
        &target,
        &RecordingObserver::new(),
        &cancel,
    );

    mock.assert();
    assert!(matches!(
        outcome,
        InstallOutcome::Cancelled {
            phase: InstallPhase::Downloading
        }
    ));
    assert!(dir_entries(&layout.install_dir()).is_empty());
}

#[test]
fn test_install_cancelled_between_chunks_removes_partial_file() {
    let body: Vec<u8> = (0..512 * 1024u32).map(|i| (i % 251) as u8).collect();
    let mut server = mockito::Server::new();
    server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_body(&body)
        .create();

    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    let target = target(&layout, &server).with_expected_digest(sha256_hex(&body));
    let cancel = CancelFlag::new();
    let observer = CancelMidDownload {
        cancel: cancel.clone(),
    };

    let outcome = installer(&layout, Box::new(NoopRegistrar)).install(&target, &observer, &cancel);

    assert!(cancel.is_cancelled());
    assert!(matches!(
        outcome,
        InstallOutcome::Cancelled {
            phase: InstallPhase::Downloading
        }
    ));
    assert!(!layout.artifact_path().exists());
    assert!(dir_entries(&layout.install_dir()).is_empty());
}

#[test]
fn test_install_task_delivers_finished_last() {
    let body = artifact_body();
    let mut server = mockito::Server::new();
    server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_body(&body)
        .create();

    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    let target = target(&layout, &server).with_expected_digest(sha256_hex(&body));

    let (handle, events) =
        InstallTask::spawn(installer(&layout, Box::new(NoopRegistrar)), target).unwrap();
    let events: Vec<InstallEvent> = events.iter().collect();

    assert!(handle.join().is_none());
    assert!(matches!(events.first(), Some(InstallEvent::Phase(InstallPhase::Preparing))));
    match events.last() {
        Some(InstallEvent::Finished(outcome)) => assert!(outcome.is_success()),
        other => panic!("Expected Finished, got {:?}", other),
    }
    let finished = events
        .iter()
        .filter(|e| matches!(e, InstallEvent::Finished(_)))
        .count();
    assert_eq!(finished, 1);
}

// ============================================================================
// Self-install and uninstall
// ============================================================================

#[test]
fn test_self_install_is_idempotent() {
    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    let downloads = TempDir::new().unwrap();
    let exe = downloads.path().join("keeper-installer");
    fs::write(&exe, b"installer binary").unwrap();

    let registrar = DesktopEntryRegistrar::without_helpers();
    let self_installer = SelfInstaller::new(&layout, &registrar);

    let first = self_installer.bootstrap(&exe).unwrap();
    assert!(matches!(first, SelfInstallOutcome::Installed { .. }));
    assert!(layout.resolve(Role::InstallerMenuEntry).exists());
    let modified = fs::metadata(layout.installer_path()).unwrap().modified().unwrap();

    let second = self_installer.bootstrap(&layout.installer_path()).unwrap();
    assert!(matches!(second, SelfInstallOutcome::AlreadyInstalled { .. }));
    assert_eq!(
        fs::metadata(layout.installer_path()).unwrap().modified().unwrap(),
        modified
    );
}

#[test]
fn test_uninstall_after_install() {
    let body = artifact_body();
    let mut server = mockito::Server::new();
    server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_body(&body)
        .create();

    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());
    let target = target(&layout, &server).with_expected_digest(sha256_hex(&body));
    fs::create_dir_all(layout.desktop_dir()).unwrap();
    let registrar = DesktopEntryRegistrar::without_helpers();

    let outcome = installer(&layout, Box::new(registrar.clone())).install(
        &target,
        &RecordingObserver::new(),
        &CancelFlag::new(),
    );
    assert!(outcome.is_success());

    let coordinator = UninstallCoordinator::new(&layout, &registrar);
    assert!(coordinator.is_installed());

    let report = coordinator.uninstall();

    assert!(report.is_clean());
    assert!(!coordinator.is_installed());
    assert!(!layout.resolve(Role::MenuEntry).exists());
    assert!(!layout.resolve(Role::DesktopIcon).exists());
    assert!(!layout.vendor_dir().exists());
}

#[test]
fn test_uninstall_empty_root_is_clean() {
    let home = TempDir::new().unwrap();
    let layout = InstallationLayout::new(home.path());

    let report = UninstallCoordinator::new(&layout, &NoopRegistrar).uninstall();

    assert!(report.failed.is_empty());
    assert!(report.removed.is_empty());
    assert!(report.absent.contains(&Role::ManagedArtifact));
    assert!(!layout.vendor_dir().exists());
}
