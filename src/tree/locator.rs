//! Vertex locator: which node owns each inserted vertex

use super::{InvariantViolation, NodeId};
use crate::graph::Vertex;
use std::collections::HashMap;

/// Map from vertex to the node currently holding it
#[derive(Debug, Clone, Default)]
pub struct VertexLocator {
    positions: HashMap<Vertex, NodeId>,
}

impl VertexLocator {
    /// Empty locator
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    /// Node owning `v`
    pub fn locate(&self, v: Vertex) -> Result<NodeId, InvariantViolation> {
        self.positions
            .get(&v)
            .copied()
            .ok_or(InvariantViolation::Unlocated { vertex: v })
    }

    /// Point `v` at `node`, returning the previous owner
    pub(crate) fn assign(&mut self, v: Vertex, node: NodeId) -> Option<NodeId> {
        self.positions.insert(v, node)
    }

    /// Check whether `v` has been inserted
    pub fn contains(&self, v: Vertex) -> bool {
        self.positions.contains_key(&v)
    }

    /// Number of located vertices
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when nothing has been inserted
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// All `(vertex, owner)` pairs, arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (Vertex, NodeId)> + '_ {
        self.positions.iter().map(|(&v, &n)| (v, n))
    }
}
