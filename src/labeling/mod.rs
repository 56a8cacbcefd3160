//! Label propagation
//!
//! For the vertex `u` being inserted, every predecessor (earlier neighbour)
//! is looked up in the locator and its owning node receives a hit. The hit
//! nodes are then pushed up to the root breadth-first, marking each node once,
//! so the touched set is the union of the hit nodes' root paths. The work is
//! proportional to that set; nothing is sized by the whole tree.
//!
//! Labels follow from the hit counts:
//! - `Full` (ALL): every vertex owned by the node is a predecessor
//! - `Partial` (SOME): some but not all
//! - `Empty` (NONE): none, including nodes with an empty bag
//!
//! The tree is never modified here.

use crate::graph::Vertex;
use crate::tree::{InvariantViolation, MpqTree, NodeId, NodeKind};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::trace;

/// Ternary node label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    /// No predecessor in the bag
    Empty,
    /// Some predecessors in the bag
    Partial,
    /// Bag made of predecessors only
    Full,
}

impl Label {
    fn from_counts(hits: usize, bag: usize) -> Self {
        match hits {
            0 => Label::Empty,
            h if h == bag => Label::Full,
            _ => Label::Partial,
        }
    }
}

/// Hit counts and touched nodes for one insertion
#[derive(Debug, Clone)]
pub struct LabelingResult {
    predecessors: BTreeSet<Vertex>,
    owned: HashMap<NodeId, Vec<Vertex>>,
    hit_order: Vec<NodeId>,
    labels: HashMap<NodeId, Label>,
    touched: Vec<NodeId>,
    small: Option<NodeId>,
}

impl LabelingResult {
    /// Predecessor set the labels were computed for
    pub fn predecessors(&self) -> &BTreeSet<Vertex> {
        &self.predecessors
    }

    /// Number of predecessors owned by `node`
    pub fn hits(&self, node: NodeId) -> usize {
        self.owned(node).len()
    }

    /// Predecessors owned by `node`, ascending
    pub fn owned(&self, node: NodeId) -> &[Vertex] {
        self.owned.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Label of `node` (`Empty` for untouched nodes)
    pub fn label(&self, node: NodeId) -> Label {
        self.labels.get(&node).copied().unwrap_or(Label::Empty)
    }

    /// Nodes owning at least one predecessor, ordered by their smallest
    /// predecessor
    pub fn hit_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.hit_order.iter().copied()
    }

    /// Hit nodes and all their ancestors, in propagation order
    pub fn touched(&self) -> &[NodeId] {
        &self.touched
    }

    /// Hit node without a hit node below it (`nSmall`, the deepest hit node
    /// when all hits share one root path); `None` without predecessors
    pub fn small(&self) -> Option<NodeId> {
        self.small
    }

    /// Label of section `section` of a Q-node
    pub fn section_label(
        &self,
        tree: &MpqTree,
        node: NodeId,
        section: usize,
    ) -> Result<Label, InvariantViolation> {
        let mismatch = |reason: &str| InvariantViolation::TemplateMismatch {
            template: "section label",
            node,
            reason: reason.to_string(),
        };
        match tree.node(node)?.kind() {
            NodeKind::Q(q) => {
                let bag = q
                    .section_bag(section)
                    .ok_or_else(|| mismatch("no such section"))?;
                let hits = self.owned(node).iter().filter(|v| bag.contains(v)).count();
                Ok(Label::from_counts(hits, bag.len()))
            }
            NodeKind::P(_) => Err(mismatch("not a Q-node")),
        }
    }
}

/// Label the tree for a new vertex with the given predecessors
pub fn label(
    tree: &MpqTree,
    predecessors: &BTreeSet<Vertex>,
) -> Result<LabelingResult, InvariantViolation> {
    let mut owned: HashMap<NodeId, Vec<Vertex>> = HashMap::new();
    let mut hit_order = Vec::new();
    for &v in predecessors {
        let node = tree.locate(v)?;
        owned
            .entry(node)
            .or_insert_with(|| {
                hit_order.push(node);
                Vec::new()
            })
            .push(v);
    }

    let mut visited: HashSet<NodeId> = hit_order.iter().copied().collect();
    let mut queue: VecDeque<NodeId> = hit_order.iter().copied().collect();
    // nodes with a touched child
    let mut above: HashSet<NodeId> = HashSet::new();

    let mut touched = Vec::with_capacity(queue.len());
    while let Some(node) = queue.pop_front() {
        touched.push(node);
        if let Some(parent) = tree.node(node)?.parent() {
            above.insert(parent);
            if visited.insert(parent) {
                queue.push_back(parent);
            }
        }
    }

    let mut labels = HashMap::with_capacity(touched.len());
    for &node in &touched {
        let count = owned.get(&node).map_or(0, Vec::len);
        let label = Label::from_counts(count, tree.node(node)?.bag_len());
        trace!(node = %node, hits = count, ?label, "labelled");
        labels.insert(node, label);
    }
    let small = hit_order.iter().copied().find(|node| !above.contains(node));

    Ok(LabelingResult {
        predecessors: predecessors.clone(),
        owned,
        hit_order,
        labels,
        touched,
        small,
    })
}
