/// Scan progress reporting: lightweight messages sent from the
/// coordinator thread to the caller via a crossbeam channel.
use std::path::PathBuf;
use std::time::Duration;

use super::ScanOutcome;

/// Progress updates sent from the scan coordinator to the caller.
///
/// Exactly one terminal message (`Complete` or `Cancelled`) is sent per
/// scan, after every worker has finished.
#[derive(Debug)]
pub enum ScanProgress {
    /// One root's worker finished and its local map has been merged.
    RootFinished {
        root: PathBuf,
        dirs_found: u64,
        error_count: u64,
    },
    /// A non-fatal traversal error (e.g. permission denied on one directory).
    Error { path: String, message: String },
    /// Every root finished; the merged result is attached.
    Complete { outcome: ScanOutcome },
    /// Scan was cancelled; partial results are discarded.
    Cancelled { duration: Duration },
}
