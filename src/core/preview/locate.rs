//! Find the deepest node under a snippet position

use super::position::{LocalPosition, SourcePos};
use super::tree::{MathNode, SyntaxTree};

/// Deepest node containing a position, plus the nodes above it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLookup<'a> {
    pub node: &'a MathNode,
    /// Root-most first, ending with `node`'s parent. The tree root is not a
    /// node and never appears here.
    pub ancestors: Vec<&'a MathNode>,
}

impl<'a> NodeLookup<'a> {
    pub fn parent(&self) -> Option<&'a MathNode> {
        self.ancestors.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }
}

/// Descend from the root, at each level taking the first child whose span
/// contains `pos`. `None` means the position sits in a gap between nodes.
pub fn find_node_at(tree: &SyntaxTree, pos: LocalPosition) -> Option<NodeLookup<'_>> {
    let target = pos.to_source();
    let mut ancestors = Vec::new();
    let mut node = child_at(&tree.content, target)?;
    while let Some(child) = child_at(&node.content, target) {
        ancestors.push(node);
        node = child;
    }
    Some(NodeLookup { node, ancestors })
}

fn child_at(nodes: &[MathNode], target: SourcePos) -> Option<&MathNode> {
    nodes
        .iter()
        .find(|n| n.location.map_or(false, |loc| loc.contains(target)))
}
