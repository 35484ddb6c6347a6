/// Flat path → size map produced by a scan.
///
/// Every directory visited during a scan has exactly one entry; files are
/// folded into their containing directory and never appear as keys. Keys
/// are compared component-wise, so `/data/` and `/data` are the same entry.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Mapping from absolute directory path to its aggregated size in bytes.
///
/// Backed by a `BTreeMap` so the persisted snapshot lists paths in a
/// stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeMap(BTreeMap<PathBuf, u64>);

impl SizeMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size of `path`, replacing any previous value.
    pub fn insert(&mut self, path: impl Into<PathBuf>, size: u64) {
        self.0.insert(path.into(), size);
    }

    /// Make sure `path` has an entry, inserting `0` if it is missing.
    pub fn ensure(&mut self, path: &Path) {
        self.0.entry(path.to_path_buf()).or_insert(0);
    }

    /// Size recorded for `path`, if any.
    pub fn get(&self, path: &Path) -> Option<u64> {
        self.0.get(path).copied()
    }

    /// Size recorded for `path`, or `0` when it was never visited.
    #[inline]
    pub fn size_of(&self, path: &Path) -> u64 {
        self.get(path).unwrap_or(0)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.0.contains_key(path)
    }

    /// Remove `path` from the map, returning its size.
    pub fn remove(&mut self, path: &Path) -> Option<u64> {
        self.0.remove(path)
    }

    /// Additively merge `other` into `self`: `self[p] += other[p]` for every key.
    ///
    /// Contributions to the same path from different roots accumulate
    /// rather than overwrite. The operation is commutative and associative,
    /// so merge order across workers does not affect the result.
    pub fn merge(&mut self, other: &SizeMap) {
        for (path, &size) in &other.0 {
            let slot = self.0.entry(path.clone()).or_insert(0);
            *slot = slot.saturating_add(size);
        }
    }

    /// Owned variant of [`merge`](Self::merge) that reuses `other`'s keys.
    pub fn merge_owned(&mut self, other: SizeMap) {
        for (path, size) in other.0 {
            let slot = self.0.entry(path).or_insert(0);
            *slot = slot.saturating_add(size);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, u64)> {
        self.0.iter().map(|(p, &s)| (p.as_path(), s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(PathBuf, u64)> for SizeMap {
    fn from_iter<I: IntoIterator<Item = (PathBuf, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<P: Into<PathBuf>, const N: usize> From<[(P, u64); N]> for SizeMap {
    fn from(entries: [(P, u64); N]) -> Self {
        entries.into_iter().map(|(p, s)| (p.into(), s)).collect()
    }
}
