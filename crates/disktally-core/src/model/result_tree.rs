/// Arena-backed result tree rebuilt from a flat [`SizeMap`].
///
/// The flat map carries no parent/child links; hierarchy is derived from
/// path structure in two passes. First every entry is indexed under its
/// parent path, then the tree is grown downwards from each requested root.
///
/// Nodes live in a single `Vec<TreeNode>` and refer to each other through
/// [`NodeIndex`], which also serves as the display-node identity handed to
/// frontends. Children form a `first_child` / `next_sibling` list kept in
/// descending size order.
use super::size::format_size;
use super::size_map::SizeMap;
use compact_str::CompactString;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Lightweight index into the arena `Vec<TreeNode>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A single directory in the result tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Absolute path, exactly as keyed in the flat map (roots: as requested).
    pub path: PathBuf,

    /// Display name: the final path component, or the full path for roots.
    pub name: CompactString,

    /// Aggregated size in bytes.
    pub size: u64,

    /// Pre-formatted `size` so rendering never repeats the formatting.
    pub size_label: String,

    /// `true` if this path was one of the requested scan roots.
    pub is_root: bool,

    pub parent: Option<NodeIndex>,
    pub first_child: Option<NodeIndex>,
    pub next_sibling: Option<NodeIndex>,

    /// Set once the node has been removed from the visible tree.
    pub detached: bool,
}

impl TreeNode {
    fn new(path: PathBuf, name: CompactString, size: u64, is_root: bool) -> Self {
        Self {
            path,
            name,
            size,
            size_label: format_size(size),
            is_root,
            parent: None,
            first_child: None,
            next_sibling: None,
            detached: false,
        }
    }

    /// Whether a frontend may offer to delete this node.
    ///
    /// Scan roots (drives, chosen folders) are never offered.
    #[inline]
    pub fn is_deletable(&self) -> bool {
        !self.is_root
    }
}

/// One row of a pre-order walk: a node and its nesting depth (0 = root).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeRow {
    pub index: NodeIndex,
    pub depth: u16,
}

/// The hierarchical view of one scan's results.
#[derive(Debug, Clone, Default)]
pub struct ResultTree {
    nodes: Vec<TreeNode>,
    roots: Vec<NodeIndex>,
    by_path: HashMap<PathBuf, NodeIndex>,
}

/// Children of each parent path, borrowed from the flat map.
type ChildIndex<'a> = HashMap<&'a Path, Vec<(&'a Path, u64)>>;

/// Rebuild the hierarchy for `roots` from a flat path → size map.
///
/// Roots are emitted in request order, each with its own size even when
/// that size is zero. Below the roots, zero-sized directories are pruned
/// and every sibling group is sorted by size, largest first (ties by path).
/// Every emitted node's path is a key of `sizes` or a requested root.
pub fn build_tree(sizes: &SizeMap, roots: &[PathBuf]) -> ResultTree {
    let index = child_index(sizes);
    let mut tree = ResultTree::with_capacity(sizes.len() + roots.len());

    for root in roots {
        let root_idx = tree.add_root(root.clone(), sizes.size_of(root));
        tree.attach_descendants(root_idx, &index);
    }
    tree
}

/// Invert the flat map into a parent → children index.
///
/// Paths without a parent (filesystem roots such as `/` or `C:\`) are
/// reachable only as requested roots.
fn child_index(sizes: &SizeMap) -> ChildIndex<'_> {
    let mut index: ChildIndex<'_> = HashMap::with_capacity(sizes.len());
    for (path, size) in sizes.iter() {
        if let Some(parent) = path.parent() {
            index.entry(parent).or_default().push((path, size));
        }
    }
    index
}

impl ResultTree {
    /// Create an empty tree with pre-allocated capacity.
    pub fn with_capacity(estimated_nodes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(estimated_nodes),
            roots: Vec::new(),
            by_path: HashMap::with_capacity(estimated_nodes),
        }
    }

    fn add_node(&mut self, node: TreeNode) -> NodeIndex {
        let idx = NodeIndex::new(self.nodes.len());
        self.by_path.entry(node.path.clone()).or_insert(idx);
        self.nodes.push(node);
        idx
    }

    fn add_root(&mut self, path: PathBuf, size: u64) -> NodeIndex {
        let name = CompactString::new(path.to_string_lossy());
        let idx = self.add_node(TreeNode::new(path, name, size, true));
        self.roots.push(idx);
        idx
    }

    /// Attach `child` as the first child of `parent`. O(1).
    fn add_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        let old_first = self.nodes[parent.idx()].first_child;
        self.nodes[child.idx()].next_sibling = old_first;
        self.nodes[child.idx()].parent = Some(parent);
        self.nodes[parent.idx()].first_child = Some(child);
    }

    /// Grow the subtree under `start` from the child index.
    ///
    /// Uses an explicit work stack so very deep directory chains cannot
    /// overflow the call stack.
    fn attach_descendants(&mut self, start: NodeIndex, index: &ChildIndex<'_>) {
        let mut stack = vec![start];
        while let Some(parent_idx) = stack.pop() {
            let parent_path = self.nodes[parent_idx.idx()].path.clone();
            let Some(children) = index.get(parent_path.as_path()) else {
                continue;
            };

            let mut visible: Vec<(&Path, u64)> = children
                .iter()
                .copied()
                .filter(|(_, size)| *size > 0)
                .collect();
            visible.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

            // Prepending in reverse leaves the sibling list largest-first.
            for &(path, size) in visible.iter().rev() {
                let Some(name) = path.file_name() else {
                    continue;
                };
                let node = TreeNode::new(
                    path.to_path_buf(),
                    CompactString::new(name.to_string_lossy()),
                    size,
                    false,
                );
                let child_idx = self.add_node(node);
                self.add_child(parent_idx, child_idx);
                stack.push(child_idx);
            }
        }
    }

    /// Root nodes in request order, excluding detached ones.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.roots
            .iter()
            .copied()
            .filter(|r| !self.nodes[r.idx()].detached)
            .collect()
    }

    /// Visible roots ordered largest first (stable for equal sizes).
    pub fn roots_by_size(&self) -> Vec<NodeIndex> {
        let mut roots = self.roots();
        roots.sort_by(|a, b| self.nodes[b.idx()].size.cmp(&self.nodes[a.idx()].size));
        roots
    }

    /// Direct children of `parent`, largest first.
    pub fn children(&self, parent: NodeIndex) -> Vec<NodeIndex> {
        let mut children = Vec::new();
        let mut child = self.nodes[parent.idx()].first_child;
        while let Some(idx) = child {
            children.push(idx);
            child = self.nodes[idx.idx()].next_sibling;
        }
        children
    }

    /// Get the node at the given index.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &TreeNode {
        &self.nodes[index.idx()]
    }

    /// Absolute path behind a display node, for delete/open actions.
    #[inline]
    pub fn path(&self, index: NodeIndex) -> &Path {
        &self.nodes[index.idx()].path
    }

    /// Look up the node for `path`. Overlapping roots may emit the same
    /// path twice; the first emission wins.
    pub fn find(&self, path: &Path) -> Option<NodeIndex> {
        self.by_path
            .get(path)
            .copied()
            .filter(|idx| !self.nodes[idx.idx()].detached)
    }

    /// Sum of the visible roots' sizes.
    pub fn total_size(&self) -> u64 {
        self.roots().iter().map(|r| self.nodes[r.idx()].size).sum()
    }

    /// Pre-order walk of the visible tree, children largest first.
    ///
    /// `max_depth` limits how deep the walk descends; `Some(0)` yields
    /// the roots only.
    pub fn rows(&self, max_depth: Option<u16>) -> Vec<TreeRow> {
        let mut rows = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<TreeRow> = self
            .roots()
            .into_iter()
            .rev()
            .map(|index| TreeRow { index, depth: 0 })
            .collect();

        while let Some(row) = stack.pop() {
            rows.push(row);
            if max_depth.is_some_and(|max| row.depth >= max) {
                continue;
            }
            for child in self.children(row.index).into_iter().rev() {
                stack.push(TreeRow {
                    index: child,
                    depth: row.depth.saturating_add(1),
                });
            }
        }
        rows
    }

    /// Remove a node (and its subtree) from the visible tree.
    ///
    /// Called after an external delete succeeded. Ancestor sizes keep their
    /// scanned values; nothing is re-scanned. Returns the removed path, or
    /// `None` if the node was already detached.
    pub fn detach(&mut self, index: NodeIndex) -> Option<PathBuf> {
        if self.nodes[index.idx()].detached {
            return None;
        }

        match self.nodes[index.idx()].parent {
            Some(parent) => self.unlink_child(parent, index),
            None => self.roots.retain(|&r| r != index),
        }

        let mut stack = vec![index];
        while let Some(idx) = stack.pop() {
            let node = &mut self.nodes[idx.idx()];
            node.detached = true;
            if self.by_path.get(&node.path) == Some(&idx) {
                self.by_path.remove(&node.path);
            }
            stack.extend(self.children(idx));
        }

        Some(self.nodes[index.idx()].path.clone())
    }

    fn unlink_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        let next = self.nodes[child.idx()].next_sibling.take();
        if self.nodes[parent.idx()].first_child == Some(child) {
            self.nodes[parent.idx()].first_child = next;
            return;
        }
        let mut cursor = self.nodes[parent.idx()].first_child;
        while let Some(idx) = cursor {
            if self.nodes[idx.idx()].next_sibling == Some(child) {
                self.nodes[idx.idx()].next_sibling = next;
                return;
            }
            cursor = self.nodes[idx.idx()].next_sibling;
        }
    }

    /// Number of nodes ever emitted, detached ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
