//! Frontier traversal
//!
//! Depth-first walk over the MPQ-tree that yields one clique per leaf, in
//! frontier order: P-node children in stored order, Q-node sections left to
//! right. The clique of a leaf is the union of the bags met on its path, where
//! a Q-node contributes the bag of the section being descended.
//!
//! Only a path stack of `(node, next child)` frames is kept; bags are
//! recomputed from the stack when a leaf is reached.

use super::{InvariantViolation, MpqTree, NodeId, NodeKind};
use crate::graph::Vertex;
use std::collections::BTreeSet;

/// Clique read off one root-to-leaf path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierClique {
    /// Leaf closing the path
    pub leaf: NodeId,

    /// Number of edges between the root and the leaf
    pub depth: usize,

    /// Union of bags on the path
    pub vertices: BTreeSet<Vertex>,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    next: usize,
}

/// Depth-first leaf walk
#[derive(Debug)]
pub struct FrontierWalk<'a> {
    tree: &'a MpqTree,
    path_stack: Vec<Frame>,
}

impl<'a> FrontierWalk<'a> {
    /// Start at the root of `tree`
    pub fn new(tree: &'a MpqTree) -> Self {
        Self {
            tree,
            path_stack: vec![Frame {
                node: tree.root(),
                next: 0,
            }],
        }
    }

    /// Current stack depth
    pub fn depth(&self) -> usize {
        self.path_stack.len()
    }

    fn path_clique(&self) -> Result<BTreeSet<Vertex>, InvariantViolation> {
        let mut clique = BTreeSet::new();
        for frame in &self.path_stack {
            match self.tree.node(frame.node)?.kind() {
                NodeKind::P(p) => clique.extend(p.bag().iter().copied()),
                NodeKind::Q(q) => {
                    // `next` was bumped when the section's child was pushed
                    let section = frame.next.saturating_sub(1);
                    if let Some(bag) = q.section_bag(section) {
                        clique.extend(bag.iter().copied());
                    }
                }
            }
        }
        Ok(clique)
    }

    fn advance(&mut self) -> Result<Option<FrontierClique>, InvariantViolation> {
        while let Some(&Frame { node, next }) = self.path_stack.last() {
            let current = self.tree.node(node)?;

            if current.child_count() == 0 {
                let depth = self.path_stack.len() - 1;
                let vertices = self.path_clique()?;
                self.path_stack.pop();
                if node == self.tree.root() {
                    // Empty tree
                    return Ok(None);
                }
                return Ok(Some(FrontierClique {
                    leaf: node,
                    depth,
                    vertices,
                }));
            }

            if let Some(child) = current.child(next) {
                if let Some(top) = self.path_stack.last_mut() {
                    top.next += 1;
                }
                self.path_stack.push(Frame {
                    node: child,
                    next: 0,
                });
            } else {
                self.path_stack.pop();
            }
        }
        Ok(None)
    }
}

impl Iterator for FrontierWalk<'_> {
    type Item = Result<FrontierClique, InvariantViolation>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(clique) => clique.map(Ok),
            Err(err) => {
                self.path_stack.clear();
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Node, Span};
    use std::collections::BTreeMap;

    #[test]
    fn test_empty_tree_has_no_cliques() {
        let tree = MpqTree::new();
        assert_eq!(FrontierWalk::new(&tree).count(), 0);
    }

    #[test]
    fn test_q_node_sections_contribute_their_bags() {
        // Q-node over three sections: 1 spans 0..=1, 2 spans 1..=2
        let mut tree = MpqTree::new();
        let leaves: Vec<NodeId> = [3, 4, 5]
            .iter()
            .map(|&v| tree.alloc(Node::leaf(BTreeSet::from([v]))))
            .collect();
        let spans = BTreeMap::from([(1, Span::new(0, 1)), (2, Span::new(1, 2))]);
        let q = tree.alloc(Node::q(leaves, spans));
        tree.adopt(q).unwrap();
        tree.attach_component(q).unwrap();

        let cliques: Vec<BTreeSet<Vertex>> = FrontierWalk::new(&tree)
            .map(|c| c.unwrap().vertices)
            .collect();
        assert_eq!(
            cliques,
            vec![
                BTreeSet::from([1, 3]),
                BTreeSet::from([1, 2, 4]),
                BTreeSet::from([2, 5]),
            ]
        );
    }
}
