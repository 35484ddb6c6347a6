/// Plain-text rendering of a result tree.
use disktally_core::model::ResultTree;
use std::fmt::Write;

/// Indentation per nesting level.
const INDENT: &str = "  ";

/// Render the visible tree, one directory per line, largest first.
///
/// Each line is the indented name followed by the formatted size.
/// `max_depth` of `Some(0)` prints the roots only.
pub fn render_tree(tree: &ResultTree, max_depth: Option<u16>) -> String {
    let rows = tree.rows(max_depth);
    let width = rows
        .iter()
        .map(|r| INDENT.len() * r.depth as usize + tree.node(r.index).name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for row in rows {
        let node = tree.node(row.index);
        let label = format!("{}{}", INDENT.repeat(row.depth as usize), node.name);
        let pad = width.saturating_sub(label.chars().count());
        let _ = writeln!(out, "{label}{}  {:>10}", " ".repeat(pad), node.size_label);
    }
    out
}
