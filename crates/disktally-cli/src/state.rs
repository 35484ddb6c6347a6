/// Application state management.
///
/// Centralises the session state a frontend reads and writes. The scan
/// coordinator communicates via its progress channel; state updates happen
/// in `process_scan_messages()`, which a frontend calls repeatedly (once per
/// frame in a GUI, in a polling loop on the command line).
///
/// Data flow: `start_scan` → coordinator → `Complete` → snapshot saved →
/// tree rebuilt. At startup `restore_last_results` skips the scan and
/// rebuilds the tree straight from the snapshot.
use disktally_core::model::{build_tree, NodeIndex, ResultTree, SizeMap};
use disktally_core::scanner::progress::ScanProgress;
use disktally_core::scanner::{ScanHandle, ScanOptions};
use disktally_core::store::ResultStore;
use disktally_core::ScanError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// The current phase of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    /// No scan in progress and no results to show.
    Idle,
    /// Workers are running.
    Scanning,
    /// Results are available, from a scan or a restored snapshot.
    Results,
}

pub const STATUS_READY: &str = "Ready. Select drives or folders to scan.";
pub const STATUS_SCANNING: &str = "Scanning, please wait...";
pub const STATUS_COMPLETE: &str = "Scan complete.";
pub const STATUS_LOADED: &str = "Last scan results loaded.";
pub const STATUS_LOAD_FAILED: &str = "Error: could not load last scan results.";
pub const STATUS_NO_ROOTS: &str = "Select at least one drive or folder to scan.";
pub const STATUS_CANCELLED: &str = "Scan cancelled.";

/// Maximum number of scan-progress messages drained per call.
///
/// Prevents a backlog of per-path errors from stalling the caller's loop.
const MAX_MESSAGES_PER_FRAME: usize = 300;

/// Maximum per-path errors retained for display. The count keeps going.
pub const MAX_SCAN_ERRORS: usize = 1_000;

/// All session state.
pub struct AppState {
    // ── Configuration ──────────────────────────────────
    pub store: ResultStore,
    pub threads: usize,

    // ── Scan ───────────────────────────────────────────
    pub phase: AppPhase,
    pub scan_handle: Option<ScanHandle>,
    pub roots_finished: usize,
    pub scan_error_count: u64,
    pub scan_errors: Vec<(String, String)>,
    pub scan_duration: Option<Duration>,
    /// True if the most recent scan was cancelled.
    pub scan_was_cancelled: bool,
    /// True if the most recent completed scan could not be saved.
    pub save_failed: bool,

    // ── Results ────────────────────────────────────────
    /// Roots of the result currently shown.
    pub targets: Vec<PathBuf>,
    /// Flat map behind the result currently shown.
    pub sizes: SizeMap,
    pub tree: Option<ResultTree>,
    /// True if the current result came from the snapshot, not a scan.
    pub from_snapshot: bool,
    pub selected_node: Option<NodeIndex>,

    // ── UI state ───────────────────────────────────────
    pub status: String,
}

impl AppState {
    /// Create initial session state. Nothing is loaded or scanned yet.
    pub fn new(store: ResultStore, threads: usize) -> Self {
        Self {
            store,
            threads,
            phase: AppPhase::Idle,
            scan_handle: None,
            roots_finished: 0,
            scan_error_count: 0,
            scan_errors: Vec::new(),
            scan_duration: None,
            scan_was_cancelled: false,
            save_failed: false,
            targets: Vec::new(),
            sizes: SizeMap::new(),
            tree: None,
            from_snapshot: false,
            selected_node: None,
            status: STATUS_READY.to_string(),
        }
    }

    /// Restore the last snapshot without scanning.
    ///
    /// Returns `true` if results were loaded. A missing snapshot leaves the
    /// session idle; an unreadable one also sets an error status.
    pub fn restore_last_results(&mut self) -> bool {
        match self.store.try_load() {
            Ok(Some(snapshot)) => {
                self.show_results(snapshot.targets, snapshot.sizes, true);
                self.status = STATUS_LOADED.to_string();
                true
            }
            Ok(None) => {
                self.status = STATUS_READY.to_string();
                false
            }
            Err(err) => {
                warn!("Load failed: {err}");
                self.status = STATUS_LOAD_FAILED.to_string();
                false
            }
        }
    }

    /// Start a scan of `roots`.
    ///
    /// An empty request is rejected with a warning status before anything
    /// else changes, so previous results stay on screen.
    pub fn start_scan(&mut self, roots: Vec<PathBuf>) -> Result<(), ScanError> {
        if roots.is_empty() {
            self.status = STATUS_NO_ROOTS.to_string();
            return Err(ScanError::NoRoots);
        }

        self.cancel_scan();
        let options = ScanOptions::default().with_threads(self.threads);
        let handle = disktally_core::scanner::start_scan(roots.clone(), options)?;

        // Reset scan state.
        self.phase = AppPhase::Scanning;
        self.roots_finished = 0;
        self.scan_error_count = 0;
        self.scan_errors.clear();
        self.scan_duration = None;
        self.scan_was_cancelled = false;
        self.save_failed = false;
        self.targets = roots;
        self.sizes = SizeMap::new();
        self.tree = None;
        self.from_snapshot = false;
        self.selected_node = None;
        self.status = STATUS_SCANNING.to_string();
        self.scan_handle = Some(handle);
        Ok(())
    }

    /// Cancel any running scan.
    pub fn cancel_scan(&mut self) {
        if let Some(ref handle) = self.scan_handle {
            handle.cancel();
        }
    }

    /// Process pending scan progress messages.
    ///
    /// Returns `true` if anything changed and the frontend should redraw.
    pub fn process_scan_messages(&mut self) -> bool {
        let handle = match &self.scan_handle {
            Some(h) => h,
            None => return false,
        };

        let mut repaint = false;
        let mut messages_this_frame = 0usize;
        while messages_this_frame < MAX_MESSAGES_PER_FRAME {
            let msg = match handle.progress_rx.try_recv() {
                Ok(m) => m,
                Err(crossbeam_channel::TryRecvError::Empty) => break,
                Err(crossbeam_channel::TryRecvError::Disconnected) => {
                    // Coordinator gone without a terminal message.
                    self.scan_handle = None;
                    self.phase = AppPhase::Idle;
                    self.status = ScanError::Interrupted.to_string();
                    return true;
                }
            };
            messages_this_frame += 1;
            repaint = true;
            match msg {
                ScanProgress::RootFinished { .. } => {
                    self.roots_finished += 1;
                }
                ScanProgress::Error { path, message } => {
                    self.scan_error_count += 1;
                    if self.scan_errors.len() < MAX_SCAN_ERRORS {
                        self.scan_errors.push((path, message));
                    }
                }
                ScanProgress::Complete { outcome } => {
                    self.scan_handle = None;
                    self.scan_duration = Some(outcome.duration);
                    self.scan_error_count = self.scan_error_count.max(outcome.error_count());

                    self.save_failed = match self.store.save(&outcome.targets, &outcome.sizes) {
                        Ok(()) => false,
                        Err(err) => {
                            warn!("Could not save scan results: {err}");
                            true
                        }
                    };
                    self.show_results(outcome.targets, outcome.sizes, false);
                    self.status = if self.save_failed {
                        format!("{STATUS_COMPLETE} (results could not be saved)")
                    } else {
                        STATUS_COMPLETE.to_string()
                    };
                    return true;
                }
                ScanProgress::Cancelled { duration } => {
                    self.scan_handle = None;
                    self.scan_duration = Some(duration);
                    self.scan_was_cancelled = true;
                    self.targets.clear();
                    self.phase = AppPhase::Idle;
                    self.status = STATUS_CANCELLED.to_string();
                    return true;
                }
            }
        }

        repaint
    }

    /// Pump `process_scan_messages` until the scan leaves `Scanning`.
    pub fn wait_for_scan(&mut self, poll: Duration) {
        while self.phase == AppPhase::Scanning {
            if !self.process_scan_messages() {
                std::thread::sleep(poll);
            }
        }
    }

    /// Rebuild the tree for a result and make it current.
    fn show_results(&mut self, targets: Vec<PathBuf>, sizes: SizeMap, from_snapshot: bool) {
        self.tree = Some(build_tree(&sizes, &targets));
        self.targets = targets;
        self.sizes = sizes;
        self.from_snapshot = from_snapshot;
        self.selected_node = None;
        self.phase = AppPhase::Results;
    }

    /// Get a reference to the current tree, if any.
    pub fn current_tree(&self) -> Option<&ResultTree> {
        self.tree.as_ref()
    }

    /// Absolute path behind a display node, for delete/open actions.
    pub fn node_path(&self, node: NodeIndex) -> Option<&Path> {
        self.tree.as_ref().map(|t| t.path(node))
    }

    /// Drop a node from the tree after an external delete succeeded.
    ///
    /// Sizes are not recomputed; the next scan brings them up to date.
    pub fn remove_node(&mut self, node: NodeIndex) -> Option<PathBuf> {
        let removed = self.tree.as_mut()?.detach(node)?;
        if self.selected_node == Some(node) {
            self.selected_node = None;
        }
        self.status = format!("Deleted {}", removed.display());
        Some(removed)
    }
}

/// Build a scan request: selected drives first, then custom folders.
pub fn compose_targets(drives: &[PathBuf], folders: &[PathBuf]) -> Vec<PathBuf> {
    drives.iter().chain(folders).cloned().collect()
}
