//! Graphviz (DOT) rendering of the discovered neighbourhood.

use std::io::Write;

use crate::error::Result;
use crate::graph::NodeStore;

/// Counts of what an export wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportStats {
    /// Nodes selected by the display radius.
    pub nodes: usize,
    /// Edge lines written.
    pub edges: usize,
}

/// Write nodes with `distance < display_radius` and their edges as an
/// undirected DOT graph.
///
/// Each friend of a selected node is declared too, so no edge refers to an
/// undeclared node. An edge is written from the node with the larger id
/// (`friend < node`), plus every edge to a friend sitting exactly at
/// `display_radius`: such friends are never selected, so this is the only
/// place their edges can appear. The rule deduplicates the common case but
/// does not guarantee each pair appears exactly once.
pub fn write_dot<W: Write>(store: &NodeStore, sink: &mut W, display_radius: u32) -> Result<ExportStats> {
    let mut stats = ExportStats::default();

    sink.write_all(b"graph g {\nratio=0.5;\n")?;

    for (id, node) in store.iter().filter(|(_, n)| n.distance() < display_radius) {
        stats.nodes += 1;
        log::info!("User {} has distance {}", node.display_name(), node.distance());

        writeln!(sink, "\t{} [label=\"{}\"];", id, sanitize_label(node.display_name()))?;

        for &friend_id in node.friends() {
            let (friend_name, friend_distance) = store
                .get(friend_id)
                .map(|f| (f.display_name(), f.distance()))
                .unwrap_or(("", crate::graph::UNKNOWN_DISTANCE));

            writeln!(sink, "\t{} [label=\"{}\"];", friend_id, sanitize_label(friend_name))?;

            if friend_id < id || friend_distance == display_radius {
                writeln!(sink, "\t{} -- {};", id, friend_id)?;
                stats.edges += 1;
            }
        }
    }

    sink.write_all(b"}\n")?;
    sink.flush()?;
    Ok(stats)
}

/// Drop non-ASCII characters and escape what would end a quoted DOT string.
pub fn sanitize_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    for c in name.chars().filter(char::is_ascii) {
        if c == '"' || c == '\\' {
            label.push('\\');
        }
        label.push(c);
    }
    label
}
