//! MPQ-tree store
//!
//! The tree is an arena of nodes addressed by `NodeId` handles. Parent links
//! and child/section lists are handles, never owning references, so local
//! relinking is a matter of overwriting a few indices.
//!
//! Shape kept between insertions:
//! - the root is a P-node with an empty bag; its children are the connected
//!   components inserted so far
//! - every inserted vertex is owned by exactly one node (the locator agrees)
//! - Q-nodes have at least three sections, every span covers at least two
//!   sections and neighbouring sections share a vertex
//! - a leaf with an empty bag only occurs as the child of a Q-node section

mod arena;
mod locator;
mod node;
mod traversal;

pub use arena::NodeId;
pub use locator::VertexLocator;
pub use node::{Children, Node, NodeKind, PNode, QNode, Sections, Span};
pub use traversal::{FrontierClique, FrontierWalk};

pub(crate) use arena::NodeArena;
pub(crate) use node::format_bag;

use crate::graph::Vertex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Broken internal invariant of the MPQ-tree
///
/// These are faults, never a classification outcome: they mean the tree (or
/// the vertex order fed to it) is inconsistent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Vertex expected in the tree has no owning node
    #[error("vertex {vertex} is not held by any node")]
    Unlocated {
        /// Vertex looked up
        vertex: Vertex,
    },

    /// Locator points at a node that does not hold the vertex
    #[error("vertex {vertex} is located at {node} but that node does not hold it")]
    StaleLocation {
        /// Vertex looked up
        vertex: Vertex,
        /// Node named by the locator
        node: NodeId,
    },

    /// Vertex held by two nodes at once
    #[error("vertex {vertex} is held by both {first} and {second}")]
    DuplicateVertex {
        /// Vertex found twice
        vertex: Vertex,
        /// First owner met
        first: NodeId,
        /// Second owner met
        second: NodeId,
    },

    /// Vertex inserted a second time
    #[error("vertex {vertex} is already in the tree")]
    AlreadyInserted {
        /// Vertex being inserted
        vertex: Vertex,
    },

    /// Handle does not refer to a live node
    #[error("node handle {node} does not refer to a live node")]
    DanglingNode {
        /// Offending handle
        node: NodeId,
    },

    /// Live node not reachable from the root
    #[error("node {node} is live but unreachable from the root")]
    Orphaned {
        /// Offending node
        node: NodeId,
    },

    /// Parent link disagrees with the child list
    #[error("node {node} has parent {found:?}, expected {expected:?}")]
    ParentMismatch {
        /// Child node
        node: NodeId,
        /// Parent implied by the child lists
        expected: Option<NodeId>,
        /// Parent stored on the node
        found: Option<NodeId>,
    },

    /// Parent links loop
    #[error("parent links starting at {node} never reach the root")]
    ParentCycle {
        /// Start of the walk
        node: NodeId,
    },

    /// Q-node with fewer than three sections
    #[error("Q-node {node} has {sections} sections")]
    DegenerateQNode {
        /// Offending Q-node
        node: NodeId,
        /// Section count found
        sections: usize,
    },

    /// Q-node span out of range or shorter than two sections
    #[error("Q-node {node} gives vertex {vertex} the invalid span {first}..={last}")]
    BadSpan {
        /// Offending Q-node
        node: NodeId,
        /// Vertex owning the span
        vertex: Vertex,
        /// First section
        first: usize,
        /// Last section
        last: usize,
    },

    /// Section bag or child slot out of step with the spans
    #[error("Q-node {node} keeps stale bookkeeping for section {section}")]
    StaleSection {
        /// Offending Q-node
        node: NodeId,
        /// First section found out of step
        section: usize,
    },

    /// Two neighbouring sections share no vertex
    #[error("Q-node {node} falls apart between sections {section} and {}", section + 1)]
    SplitQNode {
        /// Offending Q-node
        node: NodeId,
        /// Left section of the pair
        section: usize,
    },

    /// P-node shape not allowed away from the root
    #[error("node {node} is a {shape} outside a Q-node section")]
    MisplacedNode {
        /// Offending node
        node: NodeId,
        /// Description of the shape
        shape: &'static str,
    },

    /// Template applied to a node it does not fit
    #[error("template {template} cannot be applied at {node}: {reason}")]
    TemplateMismatch {
        /// Template name
        template: &'static str,
        /// Node being rewritten
        node: NodeId,
        /// What did not fit
        reason: String,
    },

    /// Interval model read off the finished tree disagrees with the graph
    #[error("interval model disagrees with the graph on {first} and {second}")]
    RepresentationMismatch {
        /// First vertex of the pair
        first: Vertex,
        /// Second vertex of the pair (equal to `first` for a missing vertex)
        second: Vertex,
    },
}

/// Modified PQ-tree over the vertices inserted so far
#[derive(Debug, Clone)]
pub struct MpqTree {
    arena: NodeArena<Node>,
    root: NodeId,
    locator: VertexLocator,
}

impl MpqTree {
    /// Tree with a single empty root
    pub fn new() -> Self {
        let mut arena = NodeArena::new();
        let root = arena.allocate(Node::p(BTreeSet::new(), Vec::new()));
        Self {
            arena,
            root,
            locator: VertexLocator::new(),
        }
    }

    /// Root handle
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node behind `id`
    pub fn node(&self, id: NodeId) -> Result<&Node, InvariantViolation> {
        self.arena
            .get(id)
            .ok_or(InvariantViolation::DanglingNode { node: id })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, InvariantViolation> {
        self.arena
            .get_mut(id)
            .ok_or(InvariantViolation::DanglingNode { node: id })
    }

    /// Node owning `v`
    pub fn locate(&self, v: Vertex) -> Result<NodeId, InvariantViolation> {
        self.locator.locate(v)
    }

    /// Vertex locator
    pub fn locator(&self) -> &VertexLocator {
        &self.locator
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        self.arena.allocate(node)
    }

    pub(crate) fn release(&mut self, id: NodeId) -> Result<Node, InvariantViolation> {
        self.arena
            .release(id)
            .ok_or(InvariantViolation::DanglingNode { node: id })
    }

    /// Point the children of `id` back at it and relocate its vertices to it
    pub(crate) fn adopt(&mut self, id: NodeId) -> Result<(), InvariantViolation> {
        let node = self.node(id)?;
        let children: Vec<NodeId> = node.children().collect();
        let vertices = node.vertices();
        for child in children {
            self.node_mut(child)?.parent = Some(id);
        }
        for v in vertices {
            self.locator.assign(v, id);
        }
        Ok(())
    }

    /// Record `node` as the owner of `v`
    pub(crate) fn relocate(&mut self, v: Vertex, node: NodeId) {
        self.locator.assign(v, node);
    }

    /// Hang `child` under the root as a new component
    pub(crate) fn attach_component(&mut self, child: NodeId) -> Result<(), InvariantViolation> {
        let root = self.root;
        match &mut self.node_mut(root)?.kind {
            NodeKind::P(p) => p.children.push(child),
            NodeKind::Q(_) => {
                return Err(InvariantViolation::MisplacedNode {
                    node: root,
                    shape: "Q-node root",
                })
            }
        }
        self.node_mut(child)?.parent = Some(root);
        Ok(())
    }

    /// Swap `old` for `new` in the child list of `parent`
    pub(crate) fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        new: NodeId,
    ) -> Result<(), InvariantViolation> {
        let replaced = match &mut self.node_mut(parent)?.kind {
            NodeKind::P(p) => match p.children.iter_mut().find(|c| **c == old) {
                Some(slot) => {
                    *slot = new;
                    true
                }
                None => false,
            },
            NodeKind::Q(q) => q.replace_child(old, new),
        };
        if !replaced {
            return Err(InvariantViolation::ParentMismatch {
                node: old,
                expected: None,
                found: Some(parent),
            });
        }
        self.node_mut(new)?.parent = Some(parent);
        Ok(())
    }

    /// `id` followed by its ancestors, ending at the root
    pub fn path_to_root(&self, id: NodeId) -> Result<Vec<NodeId>, InvariantViolation> {
        let mut path = vec![id];
        let mut cursor = self.node(id)?.parent();
        while let Some(parent) = cursor {
            if path.len() > self.arena.live_count() {
                return Err(InvariantViolation::ParentCycle { node: id });
            }
            path.push(parent);
            cursor = self.node(parent)?.parent();
        }
        Ok(path)
    }

    /// Leaf walk in frontier order
    pub fn walk(&self) -> FrontierWalk<'_> {
        FrontierWalk::new(self)
    }

    /// Cliques of all root-to-leaf paths, in frontier order
    pub fn cliques(&self) -> Result<Vec<BTreeSet<Vertex>>, InvariantViolation> {
        self.walk().map(|c| c.map(|c| c.vertices)).collect()
    }

    /// Number of inserted vertices
    pub fn vertex_count(&self) -> usize {
        self.locator.len()
    }

    /// Number of live nodes, root included
    pub fn node_count(&self) -> usize {
        self.arena.live_count()
    }

    /// Verify every structural invariant of the store
    pub fn check_consistency(&self) -> Result<(), InvariantViolation> {
        let root = self.node(self.root)?;
        if root.parent().is_some() || !matches!(root.kind(), NodeKind::P(p) if p.bag().is_empty())
        {
            return Err(InvariantViolation::MisplacedNode {
                node: self.root,
                shape: "root without the empty P-node shape",
            });
        }

        let mut owners: HashMap<Vertex, NodeId> = HashMap::new();
        let mut reached: HashSet<NodeId> = HashSet::new();
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            reached.insert(id);
            let node = self.node(id)?;

            for v in node.vertices() {
                if let Some(first) = owners.insert(v, id) {
                    return Err(InvariantViolation::DuplicateVertex {
                        vertex: v,
                        first,
                        second: id,
                    });
                }
                if self.locator.locate(v)? != id {
                    return Err(InvariantViolation::StaleLocation {
                        vertex: v,
                        node: self.locator.locate(v)?,
                    });
                }
            }

            self.check_shape(id, node)?;

            for child in node.children() {
                let found = self.node(child)?.parent();
                if found != Some(id) {
                    return Err(InvariantViolation::ParentMismatch {
                        node: child,
                        expected: Some(id),
                        found,
                    });
                }
                stack.push(child);
            }
        }

        if let Some(node) = self.arena.ids().find(|id| !reached.contains(id)) {
            return Err(InvariantViolation::Orphaned { node });
        }
        if let Some((vertex, node)) = self.locator.iter().find(|(v, _)| !owners.contains_key(v)) {
            return Err(InvariantViolation::StaleLocation { vertex, node });
        }
        Ok(())
    }

    fn check_shape(&self, id: NodeId, node: &Node) -> Result<(), InvariantViolation> {
        let under_section = match node.parent() {
            Some(parent) => matches!(self.node(parent)?.kind(), NodeKind::Q(_)),
            None => return Ok(()),
        };

        match node.kind() {
            NodeKind::P(p) => {
                if p.is_leaf() && p.bag().is_empty() && !under_section {
                    return Err(InvariantViolation::MisplacedNode {
                        node: id,
                        shape: "empty leaf",
                    });
                }
                if p.children().len() == 1 {
                    let child_is_q = matches!(self.node(p.children()[0])?.kind(), NodeKind::Q(_));
                    if !child_is_q || p.bag().is_empty() {
                        return Err(InvariantViolation::MisplacedNode {
                            node: id,
                            shape: "P-node with a single child",
                        });
                    }
                }
            }
            NodeKind::Q(q) => {
                let m = q.section_count();
                if m < 3 {
                    return Err(InvariantViolation::DegenerateQNode {
                        node: id,
                        sections: m,
                    });
                }
                for (vertex, span) in q.spans() {
                    if span.last >= m || span.len() < 2 {
                        return Err(InvariantViolation::BadSpan {
                            node: id,
                            vertex,
                            first: span.first,
                            last: span.last,
                        });
                    }
                }
                if let Err(section) = q.audit() {
                    return Err(InvariantViolation::StaleSection { node: id, section });
                }
                let bags: Vec<&BTreeSet<Vertex>> =
                    (0..m).filter_map(|j| q.section_bag(j)).collect();
                if let Some(section) = bags
                    .windows(2)
                    .position(|pair| pair[0].is_disjoint(pair[1]))
                {
                    return Err(InvariantViolation::SplitQNode { node: id, section });
                }
            }
        }
        Ok(())
    }
}

impl Default for MpqTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Indented outline, one node per line
impl fmt::Display for MpqTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Ok(node) = self.node(id) else {
                writeln!(f, "{:indent$}<dangling {}>", "", id, indent = depth * 2)?;
                continue;
            };
            write!(f, "{:indent$}{} ", "", node.kind_name(), indent = depth * 2)?;
            match node.kind() {
                NodeKind::P(p) => format_bag(f, p.bag())?,
                NodeKind::Q(q) => {
                    let spans: Vec<String> = q
                        .spans()
                        .map(|(v, s)| format!("{}:{}..{}", v, s.first, s.last))
                        .collect();
                    write!(f, "[{}]", spans.join(" "))?;
                }
            }
            writeln!(f)?;
            for child in node.children().rev() {
                stack.push((child, depth + 1));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(tree: &mut MpqTree, bag: &[Vertex]) -> NodeId {
        let id = tree.alloc(Node::leaf(bag.iter().copied().collect()));
        tree.adopt(id).unwrap();
        id
    }

    #[test]
    fn test_new_tree_is_consistent() {
        let tree = MpqTree::new();
        assert!(tree.check_consistency().is_ok());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.vertex_count(), 0);
        assert!(tree.cliques().unwrap().is_empty());
    }

    #[test]
    fn test_components_hang_under_root() {
        let mut tree = MpqTree::new();
        let a = leaf(&mut tree, &[1, 2]);
        let b = leaf(&mut tree, &[3]);
        tree.attach_component(a).unwrap();
        tree.attach_component(b).unwrap();

        assert!(tree.check_consistency().is_ok());
        assert_eq!(tree.locate(2).unwrap(), a);
        assert_eq!(tree.path_to_root(b).unwrap(), vec![b, tree.root()]);
        assert_eq!(
            tree.cliques().unwrap(),
            vec![BTreeSet::from([1, 2]), BTreeSet::from([3])]
        );
        assert_eq!(tree.to_string(), "P {}\n  leaf {1,2}\n  leaf {3}\n");
    }

    #[test]
    fn test_replace_child_relinks_parent() {
        let mut tree = MpqTree::new();
        let a = leaf(&mut tree, &[1]);
        tree.attach_component(a).unwrap();

        let b = leaf(&mut tree, &[1, 2]);
        tree.replace_child(tree.root(), a, b).unwrap();
        tree.release(a).unwrap();

        assert!(tree.check_consistency().is_ok());
        assert_eq!(tree.node(b).unwrap().parent(), Some(tree.root()));
        assert!(matches!(
            tree.node(a),
            Err(InvariantViolation::DanglingNode { .. })
        ));
    }

    #[test]
    fn test_consistency_detects_orphans_and_duplicates() {
        let mut tree = MpqTree::new();
        let a = leaf(&mut tree, &[1]);
        assert!(matches!(
            tree.check_consistency(),
            Err(InvariantViolation::Orphaned { node }) if node == a
        ));

        tree.attach_component(a).unwrap();
        let b = leaf(&mut tree, &[1]);
        tree.attach_component(b).unwrap();
        assert!(matches!(
            tree.check_consistency(),
            Err(InvariantViolation::DuplicateVertex { vertex: 1, .. })
        ));
    }
}
