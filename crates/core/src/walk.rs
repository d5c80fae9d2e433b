//! Pre-order traversal and match collection.
//!
//! Every query walks the tree as it is now. Match lists are snapshots:
//! after a mutation that could detach or move matched nodes, query again.

use crate::dom_tree::{DomTree, NodeId};
use crate::select::Selector;

/// Depth-first, pre-order iterator over a subtree, starting with its root.
pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev());
        Some(id)
    }
}

/// Iterate `root` and everything below it in document order
pub fn descendants(tree: &DomTree, root: NodeId) -> Descendants<'_> {
    let stack = if tree.get(root).is_some() { vec![root] } else { Vec::new() };
    Descendants { tree, stack }
}

/// All nodes under `root` (inclusive) matching `selector`, in document order
pub fn find_all(tree: &DomTree, root: NodeId, selector: &Selector) -> Vec<NodeId> {
    descendants(tree, root).filter(|&id| selector.matches(tree, id)).collect()
}

/// The first node under `root` (inclusive) matching `selector`
pub fn find_first(tree: &DomTree, root: NodeId, selector: &Selector) -> Option<NodeId> {
    descendants(tree, root).find(|&id| selector.matches(tree, id))
}
