/// Error types surfaced to callers.
///
/// Traversal failures never appear here: they are absorbed by the scanner
/// and folded into zero-sized entries. Only request validation, worker-pool
/// setup, and snapshot persistence can fail visibly.
use std::path::PathBuf;
use thiserror::Error;

/// Failure to start or finish a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The request contained no roots. Rejected before any worker is spawned.
    #[error("select at least one drive or folder to scan")]
    NoRoots,

    /// The bounded worker pool could not be built.
    #[error("failed to build scan worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// The coordinator thread could not be spawned.
    #[error("failed to spawn scan coordinator: {0}")]
    Spawn(#[source] std::io::Error),

    /// The scan was cancelled before every root finished.
    #[error("scan was cancelled")]
    Cancelled,

    /// The coordinator stopped without delivering a terminal message.
    #[error("scan coordinator exited without reporting completion")]
    Interrupted,
}

/// Failure to read or write the snapshot file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {} is malformed: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
