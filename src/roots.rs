use crate::catalogue::Category;
use crate::graph::{Graph, GraphNode, HANDLE_PARENT};

pub const NO_ROOT_MESSAGE: &str = "The visual plan must contain at least one root HTML node (a node without a parent connection) to begin generation.";

/// HTML nodes with no live incoming `parent` edge, in input order.
///
/// An empty result is not an error: the assembler answers with
/// [`NO_ROOT_MESSAGE`] instead of file content.
pub fn resolve_roots(graph: &Graph) -> Vec<&GraphNode> {
    graph
        .nodes()
        .iter()
        .filter(|node| node.kind.category() == Some(Category::Html))
        .filter(|node| !graph.has_incoming(&node.id, HANDLE_PARENT))
        .collect()
}
