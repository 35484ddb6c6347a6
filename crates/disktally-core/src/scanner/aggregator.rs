/// Per-root size aggregation: the worker half of a scan.
///
/// A single `jwalk` pass lists the root's subtree without following
/// symbolic links. File sizes are summed into their containing directory
/// as entries stream past; directories are only recorded with their depth.
/// A second pass then visits the recorded directories deepest-first, so
/// every directory is sized after all of its subdirectories:
///
/// ```text
/// size(dir) = Σ direct regular files + Σ size(direct subdirectories)
/// ```
///
/// Traversal failures are local. A directory that cannot be listed keeps
/// whatever it already had (normally nothing) and ends up with size 0;
/// its ancestors are summed from the readable children only.
use super::CancelToken;
use crate::model::SizeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// A traversal failure absorbed while scanning one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalError {
    pub path: String,
    pub message: String,
}

/// Result of scanning a single root: the local map plus statistics.
#[derive(Debug, Default)]
pub struct RootScan {
    pub root: PathBuf,
    /// Local path → size map, root inclusive.
    pub sizes: SizeMap,
    pub dirs_found: u64,
    pub files_found: u64,
    pub error_count: u64,
    /// `true` if the walk stopped early on a cancellation request.
    pub cancelled: bool,
}

impl RootScan {
    /// Empty result for a root whose worker failed outright.
    pub(crate) fn failed(root: &Path) -> Self {
        let mut sizes = SizeMap::new();
        sizes.ensure(root);
        Self {
            root: root.to_path_buf(),
            sizes,
            error_count: 1,
            ..Self::default()
        }
    }
}

/// Scan `root` and size every directory beneath it, bottom-up.
///
/// Never fails: traversal errors are passed to `on_error` and the affected
/// directory contributes 0 bytes. The root is always present in the
/// returned map, even when it could not be read at all.
pub fn aggregate_root(
    root: &Path,
    cancel: &CancelToken,
    mut on_error: impl FnMut(TraversalError),
) -> RootScan {
    let start = Instant::now();
    let mut scan = RootScan {
        root: root.to_path_buf(),
        ..RootScan::default()
    };

    // Directories in discovery order, with their depth below the root.
    let mut dirs: Vec<(PathBuf, usize)> = Vec::new();
    // Bytes of regular files directly inside each directory.
    let mut file_bytes: HashMap<PathBuf, u64> = HashMap::new();

    // Roots are already fanned out across the worker pool, so each walk
    // runs serially on its own worker.
    let walker = jwalk::WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .sort(false)
        .parallelism(jwalk::Parallelism::Serial);

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                // jwalk errors are typically access-denied or vanished
                // directories; the directory itself was already yielded.
                scan.error_count += 1;
                let path = err
                    .path()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_else(|| root.to_string_lossy().into_owned());
                warn!("Skipping unreadable entry {path}: {err}");
                on_error(TraversalError {
                    path,
                    message: err.to_string(),
                });
                continue;
            }
        };

        let file_type = entry.file_type();
        // Links below the root are neither followed nor counted.
        if file_type.is_symlink() && entry.depth > 0 {
            continue;
        }

        if file_type.is_dir() || entry.depth == 0 {
            if cancel.is_cancelled() {
                scan.cancelled = true;
                break;
            }
            dirs.push((entry.path(), entry.depth));
            continue;
        }

        if !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        let Some(parent) = path.parent() else {
            continue;
        };
        match std::fs::symlink_metadata(&path) {
            Ok(meta) => {
                let slot = file_bytes.entry(parent.to_path_buf()).or_insert(0);
                *slot = slot.saturating_add(meta.len());
                scan.files_found += 1;
            }
            Err(err) => {
                scan.error_count += 1;
                debug!("Cannot stat {}: {err}", path.display());
                on_error(TraversalError {
                    path: path.to_string_lossy().into_owned(),
                    message: err.to_string(),
                });
            }
        }
    }

    scan.dirs_found = dirs.len() as u64;

    // Deepest first: every subdirectory is sized before its parent.
    dirs.sort_by(|a, b| b.1.cmp(&a.1));
    let mut subdir_bytes: HashMap<PathBuf, u64> = HashMap::new();
    for (dir, depth) in dirs {
        let size = file_bytes
            .remove(&dir)
            .unwrap_or(0)
            .saturating_add(subdir_bytes.remove(&dir).unwrap_or(0));
        if depth > 0 {
            if let Some(parent) = dir.parent() {
                let slot = subdir_bytes.entry(parent.to_path_buf()).or_insert(0);
                *slot = slot.saturating_add(size);
            }
        }
        scan.sizes.insert(dir, size);
    }
    scan.sizes.ensure(root);

    debug!(
        "Root {} sized in {:?}: {} dirs, {} files, {} errors",
        root.display(),
        start.elapsed(),
        scan.dirs_found,
        scan.files_found,
        scan.error_count
    );
    scan
}
