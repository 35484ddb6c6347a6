/// Snapshot persistence: the last completed scan, restorable at startup.
///
/// The snapshot is a human-readable UTF-8 JSON document:
///
/// ```json
/// { "targets": ["/data", "/home"], "sizes": { "/data": 1024, "/home": 0 } }
/// ```
///
/// It is overwritten wholesale after every successful scan. The file is
/// written to a sibling temporary file first and then renamed into place,
/// so a crash mid-write leaves the previous snapshot intact.
use crate::error::StoreError;
use crate::model::SizeMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// The durable form of one completed scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Scan roots in request order.
    #[serde(default)]
    pub targets: Vec<PathBuf>,
    /// Flat path → size map.
    #[serde(default)]
    pub sizes: SizeMap,
}

/// Reads and writes the snapshot file at a fixed, caller-chosen path.
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    /// File name frontends use when the user does not pick a location.
    pub const DEFAULT_FILE_NAME: &'static str = "disktally-last-scan.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `targets` and `sizes`, replacing any previous snapshot.
    ///
    /// Failures are returned, never panicked; the caller's in-memory result
    /// is untouched either way.
    pub fn save(&self, targets: &[PathBuf], sizes: &SizeMap) -> Result<(), StoreError> {
        #[derive(Serialize)]
        struct SnapshotRef<'a> {
            targets: &'a [PathBuf],
            sizes: &'a SizeMap,
        }

        let json = serde_json::to_string_pretty(&SnapshotRef { targets, sizes }).map_err(
            |source| StoreError::Json {
                path: self.path.clone(),
                source,
            },
        )?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json.as_bytes())
            .and_then(|()| fs::rename(&tmp_path, &self.path))
            .map_err(|source| {
                let _ = fs::remove_file(&tmp_path);
                StoreError::Io {
                    path: self.path.clone(),
                    source,
                }
            })?;

        info!(
            "Saved snapshot of {} root(s), {} entries to {}",
            targets.len(),
            sizes.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Restore the most recent snapshot, reporting why it could not be read.
    ///
    /// A missing file is the normal first-run state and yields `Ok(None)`,
    /// as does a snapshot with no targets or no sizes.
    pub fn try_load(&self) -> Result<Option<Snapshot>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("No snapshot at {}", self.path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let snapshot: Snapshot =
            serde_json::from_str(&text).map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;

        if snapshot.targets.is_empty() || snapshot.sizes.is_empty() {
            debug!("Snapshot at {} is empty", self.path.display());
            return Ok(None);
        }

        info!(
            "Loaded snapshot of {} root(s), {} entries from {}",
            snapshot.targets.len(),
            snapshot.sizes.len(),
            self.path.display()
        );
        Ok(Some(snapshot))
    }

    /// Restore the most recent snapshot, or `None` if there is none usable.
    ///
    /// Never fails: unreadable or malformed files are logged and treated as
    /// absent.
    pub fn load(&self) -> Option<Snapshot> {
        match self.try_load() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("Ignoring last scan results: {err}");
                None
            }
        }
    }

    /// Last-modified time of the snapshot file, if it exists.
    pub fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| Self::DEFAULT_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
