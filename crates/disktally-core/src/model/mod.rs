/// Data model for DiskTally scan results.
///
/// The scanner produces a flat [`SizeMap`]; the hierarchical
/// [`ResultTree`] is derived from it on demand and never persisted.
pub mod result_tree;
pub mod size;
pub mod size_map;

pub use result_tree::{build_tree, NodeIndex, ResultTree, TreeNode, TreeRow};
pub use size_map::SizeMap;
