/// End-to-end tests for `AppState`: the session state machine.
///
/// These tests exercise the real scan → save → build and load → build
/// paths against a temporary filesystem, with no mocking.
///
/// **Scope:**
///   - Startup with no, valid, and corrupt snapshots
///   - Scan lifecycle (input validation, completion, cancellation)
///   - Snapshot written after a scan and restored by a fresh session
///   - Post-delete removal of a node from the tree
use disktally_cli::state::{
    compose_targets, AppPhase, AppState, STATUS_COMPLETE, STATUS_LOADED, STATUS_LOAD_FAILED,
    STATUS_NO_ROOTS, STATUS_READY,
};
use disktally_core::store::ResultStore;
use disktally_core::ScanError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn write_bytes(path: &Path, n: usize) {
    fs::write(path, vec![0u8; n]).unwrap();
}

/// Two scan roots in a temp directory plus a snapshot location.
///
/// ```text
/// a/            100
///   sub/        (empty)
///   file.bin    100
/// b/            500
///   big/        300
///   small/      200
/// ```
struct Fixture {
    tmp: TempDir,
    a: PathBuf,
    b: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::create_dir_all(a.join("sub")).unwrap();
        fs::create_dir_all(b.join("big")).unwrap();
        fs::create_dir_all(b.join("small")).unwrap();
        write_bytes(&a.join("file.bin"), 100);
        write_bytes(&b.join("big/x.bin"), 300);
        write_bytes(&b.join("small/y.bin"), 200);
        Self { tmp, a, b }
    }

    fn store(&self) -> ResultStore {
        ResultStore::new(self.tmp.path().join("last-scan.json"))
    }

    fn state(&self) -> AppState {
        AppState::new(self.store(), 2)
    }
}

/// Pump `process_scan_messages()` until the phase leaves `Scanning` or the
/// deadline expires.
fn pump_until_done(state: &mut AppState) {
    let deadline = Instant::now() + Duration::from_secs(30);
    while state.phase == AppPhase::Scanning {
        assert!(
            Instant::now() < deadline,
            "scan did not complete within 30 seconds"
        );
        state.process_scan_messages();
        std::thread::sleep(Duration::from_millis(10));
    }
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// First run: no snapshot, nothing to show, ready status.
#[test]
fn startup_without_snapshot_is_idle() {
    let fx = Fixture::new();
    let mut state = fx.state();

    assert!(!state.restore_last_results());
    assert_eq!(state.phase, AppPhase::Idle);
    assert!(state.current_tree().is_none());
    assert_eq!(state.status, STATUS_READY);
}

/// A corrupt snapshot is reported in the status and otherwise ignored.
#[test]
fn startup_with_corrupt_snapshot_reports_error() {
    let fx = Fixture::new();
    fs::write(fx.store().path(), "{ \"targets\": [").unwrap();
    let mut state = fx.state();

    assert!(!state.restore_last_results());
    assert_eq!(state.phase, AppPhase::Idle);
    assert_eq!(state.status, STATUS_LOAD_FAILED);
}

// ── Scan lifecycle ─────────────────────────────────────────────────────────────

/// An empty request is rejected without touching the session.
#[test]
fn empty_request_is_rejected_with_warning() {
    let fx = Fixture::new();
    let mut state = fx.state();

    let result = state.start_scan(Vec::new());
    assert!(matches!(result, Err(ScanError::NoRoots)));
    assert_eq!(state.phase, AppPhase::Idle);
    assert!(state.scan_handle.is_none());
    assert_eq!(state.status, STATUS_NO_ROOTS);
}

/// A completed scan builds the tree and writes the snapshot.
#[test]
fn scan_completes_saves_and_builds_tree() {
    let fx = Fixture::new();
    let mut state = fx.state();

    state.start_scan(vec![fx.a.clone(), fx.b.clone()]).unwrap();
    assert_eq!(state.phase, AppPhase::Scanning);
    pump_until_done(&mut state);

    assert_eq!(state.phase, AppPhase::Results);
    assert_eq!(state.status, STATUS_COMPLETE);
    assert_eq!(state.roots_finished, 2);
    assert!(!state.from_snapshot);
    assert!(!state.save_failed);

    let tree = state.current_tree().expect("tree must exist");
    let roots = tree.roots();
    assert_eq!(tree.path(roots[0]), fx.a.as_path());
    assert_eq!(tree.node(roots[0]).size, 100);
    assert_eq!(tree.node(roots[1]).size, 500);

    let b_children: Vec<u64> = tree
        .children(roots[1])
        .iter()
        .map(|&c| tree.node(c).size)
        .collect();
    assert_eq!(b_children, vec![300, 200]);

    let saved = fx.store().load().expect("snapshot must be written");
    assert_eq!(saved.targets, vec![fx.a.clone(), fx.b.clone()]);
    assert_eq!(saved.sizes, state.sizes);
}

/// A new session restores the previous scan without rescanning.
#[test]
fn restart_restores_previous_scan() {
    let fx = Fixture::new();
    let mut first = fx.state();
    first.start_scan(vec![fx.a.clone(), fx.b.clone()]).unwrap();
    pump_until_done(&mut first);

    // Remove the data: a restored session must not look at the disk.
    fs::remove_dir_all(&fx.b).unwrap();

    let mut second = fx.state();
    assert!(second.restore_last_results());
    assert_eq!(second.phase, AppPhase::Results);
    assert_eq!(second.status, STATUS_LOADED);
    assert!(second.from_snapshot);
    assert_eq!(second.sizes, first.sizes);

    let tree = second.current_tree().unwrap();
    let b = tree.find(&fx.b).expect("restored tree keeps b");
    assert_eq!(tree.node(b).size, 500);
}

/// A save failure leaves the in-memory result intact.
#[test]
fn save_failure_keeps_results() {
    let fx = Fixture::new();
    let store = ResultStore::new(fx.tmp.path().join("missing-dir/last-scan.json"));
    let mut state = AppState::new(store, 2);

    state.start_scan(vec![fx.a.clone()]).unwrap();
    pump_until_done(&mut state);

    assert_eq!(state.phase, AppPhase::Results);
    assert!(state.save_failed);
    assert!(state.status.starts_with(STATUS_COMPLETE));
    assert!(state.current_tree().is_some());
}

/// Cancelling leaves the scanning phase; a fast scan may still complete.
#[test]
fn cancel_scan_leaves_scanning_phase() {
    let fx = Fixture::new();
    let mut state = fx.state();
    state.start_scan(vec![fx.a.clone(), fx.b.clone()]).unwrap();
    state.cancel_scan();
    pump_until_done(&mut state);

    assert_ne!(state.phase, AppPhase::Scanning);
    if state.scan_was_cancelled {
        assert_eq!(state.phase, AppPhase::Idle);
        assert!(state.current_tree().is_none());
    }
}

// ── Post-delete ───────────────────────────────────────────────────────────────

/// After an external delete, the node disappears from the tree.
#[test]
fn remove_node_detaches_from_tree() {
    let fx = Fixture::new();
    let mut state = fx.state();
    state.start_scan(vec![fx.b.clone()]).unwrap();
    pump_until_done(&mut state);

    let big_path = fx.b.join("big");
    let big = state.current_tree().unwrap().find(&big_path).unwrap();
    assert_eq!(state.node_path(big), Some(big_path.as_path()));
    assert!(state.current_tree().unwrap().node(big).is_deletable());

    assert_eq!(state.remove_node(big), Some(big_path.clone()));
    let tree = state.current_tree().unwrap();
    assert!(tree.find(&big_path).is_none());
    assert_eq!(tree.children(tree.roots()[0]).len(), 1);
    assert_eq!(state.remove_node(big), None);
}

/// Drives are listed before custom folders in a scan request.
#[test]
fn compose_targets_orders_drives_first() {
    let drives = vec![PathBuf::from("/")];
    let folders = vec![PathBuf::from("/home/user"), PathBuf::from("/srv")];
    assert_eq!(
        compose_targets(&drives, &folders),
        vec![
            PathBuf::from("/"),
            PathBuf::from("/home/user"),
            PathBuf::from("/srv")
        ]
    );
}
