/// Scanner module: orchestrates multi-root scanning.
///
/// A scan fans out one worker per requested root onto a bounded `rayon`
/// pool. Each worker sizes its root into an owned local map
/// ([`aggregator::aggregate_root`]) and hands the whole map back to the
/// coordinator thread over a channel. The coordinator merges the maps one
/// at a time into the shared [`LiveSizes`] map, holding its lock only for
/// the merge itself and never during filesystem I/O.
///
/// Once every worker has reported, the coordinator sends exactly one
/// terminal [`ScanProgress`] message: `Complete` with the merged result, or
/// `Cancelled` if the caller requested cancellation.
pub mod aggregator;
pub mod cancel;
pub mod progress;

pub use aggregator::{aggregate_root, RootScan, TraversalError};
pub use cancel::CancelToken;
use progress::ScanProgress;

use crate::error::ScanError;
use crate::model::SizeMap;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// The merged path → size map, readable by the caller while roots finish.
///
/// Only the coordinator writes to it, once per finished root.
pub type LiveSizes = Arc<Mutex<SizeMap>>;

/// Maximum number of progress messages that may queue up in the channel.
///
/// Per-path error messages are dropped rather than blocking a worker when
/// the channel is full; error counts in [`RootSummary`] stay exact.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Scan configuration.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Worker pool size. Scanning is I/O-bound, so exceeding the core
    /// count is fine. Zero is treated as one.
    pub threads: usize,
    /// Shared cancellation flag checked at every directory.
    pub cancel: CancelToken,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            cancel: CancelToken::new(),
        }
    }
}

impl ScanOptions {
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Per-root statistics reported with the final outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSummary {
    pub root: PathBuf,
    pub size: u64,
    pub dirs_found: u64,
    pub files_found: u64,
    pub error_count: u64,
}

/// The result of one completed scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Roots in request order (duplicates preserved).
    pub targets: Vec<PathBuf>,
    /// Merged flat map across all roots.
    pub sizes: SizeMap,
    /// One summary per target, in request order.
    pub roots: Vec<RootSummary>,
    pub duration: Duration,
}

impl ScanOutcome {
    /// Total traversal errors absorbed across all roots.
    pub fn error_count(&self) -> u64 {
        self.roots.iter().map(|r| r.error_count).sum()
    }
}

/// Handle to a running or completed scan. Allows cancellation and
/// receiving progress updates.
pub struct ScanHandle {
    /// Receiver for progress updates from the coordinator thread.
    pub progress_rx: Receiver<ScanProgress>,
    /// Shared map that accumulates merged roots as they finish.
    pub live_sizes: LiveSizes,
    cancel: CancelToken,
    _thread: Option<thread::JoinHandle<()>>,
}

impl ScanHandle {
    /// Request the scan to stop as soon as possible.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Block until the scan finishes, discarding intermediate progress.
    pub fn wait(self) -> Result<ScanOutcome, ScanError> {
        for msg in self.progress_rx.iter() {
            match msg {
                ScanProgress::Complete { outcome } => return Ok(outcome),
                ScanProgress::Cancelled { .. } => return Err(ScanError::Cancelled),
                ScanProgress::RootFinished { .. } | ScanProgress::Error { .. } => {}
            }
        }
        Err(ScanError::Interrupted)
    }
}

/// Start a new scan of `roots` on a background coordinator thread.
///
/// An empty request is rejected before any thread or pool is created.
pub fn start_scan(roots: Vec<PathBuf>, options: ScanOptions) -> Result<ScanHandle, ScanError> {
    if roots.is_empty() {
        return Err(ScanError::NoRoots);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads.max(1))
        .thread_name(|i| format!("disktally-worker-{i}"))
        .build()?;

    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
    let live_sizes: LiveSizes = Arc::new(Mutex::new(SizeMap::new()));
    let live_clone = live_sizes.clone();
    let cancel = options.cancel.clone();

    let thread = thread::Builder::new()
        .name("disktally-coordinator".into())
        .spawn(move || coordinate(pool, roots, options.cancel, live_clone, progress_tx))
        .map_err(ScanError::Spawn)?;

    Ok(ScanHandle {
        progress_rx,
        live_sizes,
        cancel,
        _thread: Some(thread),
    })
}

/// Scan `roots` and block until every root has finished.
pub fn scan_roots(roots: Vec<PathBuf>, options: ScanOptions) -> Result<ScanOutcome, ScanError> {
    start_scan(roots, options)?.wait()
}

/// Coordinator body: fan out, merge sequentially, signal once.
fn coordinate(
    pool: rayon::ThreadPool,
    roots: Vec<PathBuf>,
    cancel: CancelToken,
    live_sizes: LiveSizes,
    progress_tx: Sender<ScanProgress>,
) {
    let start = Instant::now();
    info!(
        "Starting scan of {} root(s) on {} worker(s)",
        roots.len(),
        pool.current_num_threads()
    );

    let (done_tx, done_rx) = crossbeam_channel::unbounded::<(usize, RootScan)>();
    for (position, root) in roots.iter().enumerate() {
        let root = root.clone();
        let done_tx = done_tx.clone();
        let cancel = cancel.clone();
        let progress_tx = progress_tx.clone();
        pool.spawn(move || {
            let scan = scan_root_isolated(&root, &cancel, &progress_tx);
            let _ = done_tx.send((position, scan));
        });
    }
    // The loop below ends once every worker has dropped its sender.
    drop(done_tx);

    let mut summaries: Vec<Option<RootSummary>> = vec![None; roots.len()];
    for (position, scan) in done_rx.iter() {
        let summary = RootSummary {
            root: scan.root.clone(),
            size: scan.sizes.size_of(&scan.root),
            dirs_found: scan.dirs_found,
            files_found: scan.files_found,
            error_count: scan.error_count,
        };
        live_sizes.lock().merge_owned(scan.sizes);

        let _ = progress_tx.send(ScanProgress::RootFinished {
            root: summary.root.clone(),
            dirs_found: summary.dirs_found,
            error_count: summary.error_count,
        });
        summaries[position] = Some(summary);
    }

    let duration = start.elapsed();
    if cancel.is_cancelled() {
        info!("Scan cancelled after {duration:?}");
        let _ = progress_tx.send(ScanProgress::Cancelled { duration });
        return;
    }

    let sizes = {
        let mut shared = live_sizes.lock();
        for root in &roots {
            shared.ensure(root);
        }
        shared.clone()
    };
    let roots_summary: Vec<RootSummary> = summaries
        .into_iter()
        .zip(&roots)
        .map(|(summary, root)| summary.unwrap_or_else(|| missing_summary(root)))
        .collect();

    info!(
        "Scan complete: {} directories across {} root(s) in {duration:?}",
        sizes.len(),
        roots.len()
    );
    let _ = progress_tx.send(ScanProgress::Complete {
        outcome: ScanOutcome {
            targets: roots,
            sizes,
            roots: roots_summary,
            duration,
        },
    });
}

/// Run one root's worker, containing any panic to that root.
///
/// A panicking worker contributes only its root, sized 0; siblings are
/// unaffected.
fn scan_root_isolated(
    root: &Path,
    cancel: &CancelToken,
    progress_tx: &Sender<ScanProgress>,
) -> RootScan {
    let result = catch_unwind(AssertUnwindSafe(|| {
        aggregate_root(root, cancel, |err| {
            // Never block a worker on a slow consumer.
            let _ = progress_tx.try_send(ScanProgress::Error {
                path: err.path,
                message: err.message,
            });
        })
    }));

    match result {
        Ok(scan) => scan,
        Err(_) => {
            warn!("Worker for {} panicked; root contributes 0 bytes", root.display());
            let _ = progress_tx.try_send(ScanProgress::Error {
                path: root.to_string_lossy().into_owned(),
                message: "scan worker failed".to_string(),
            });
            RootScan::failed(root)
        }
    }
}

fn missing_summary(root: &Path) -> RootSummary {
    RootSummary {
        root: root.to_path_buf(),
        size: 0,
        dirs_found: 0,
        files_found: 0,
        error_count: 1,
    }
}
