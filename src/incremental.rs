//! One MPQ-tree grown vertex by vertex
//!
//! Each insertion runs Label -> Validate -> Rewrite. A rejected vertex leaves
//! the tree exactly as it was.

use crate::graph::Vertex;
use crate::labeling::label;
use crate::template;
use crate::tree::{InvariantViolation, MpqTree};
use crate::validate::{validate, Obstruction, PathPlan, Validation};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Outcome of inserting one vertex
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// Vertex added; the plan that was applied
    Inserted(PathPlan),
    /// Vertex cannot be added: the graph so far is not an interval graph
    Rejected(Obstruction),
}

impl Insertion {
    /// True when the vertex went in
    pub fn is_inserted(&self) -> bool {
        matches!(self, Insertion::Inserted(_))
    }
}

/// Incremental recogniser over a single MPQ-tree
#[derive(Debug, Clone, Default)]
pub struct IncrementalRecognizer {
    tree: MpqTree,
}

impl IncrementalRecognizer {
    /// Start from an empty tree
    pub fn new() -> Self {
        Self {
            tree: MpqTree::new(),
        }
    }

    /// Insert `u` whose earlier neighbours are `predecessors`
    ///
    /// The predecessors must already be in the tree and form a clique; a
    /// vertex inserted twice or an unknown predecessor is an invariant
    /// violation.
    pub fn insert(
        &mut self,
        u: Vertex,
        predecessors: &BTreeSet<Vertex>,
    ) -> Result<Insertion, InvariantViolation> {
        let labels = label(&self.tree, predecessors)?;
        trace!(vertex = u, touched = labels.touched().len(), "labels propagated");

        match validate(&self.tree, &labels)? {
            Validation::Rejected(obstruction) => {
                debug!(vertex = u, %obstruction, "insertion rejected");
                Ok(Insertion::Rejected(obstruction))
            }
            Validation::Valid(plan) => {
                template::apply(&mut self.tree, u, predecessors, &plan)?;
                Ok(Insertion::Inserted(plan))
            }
        }
    }

    /// Current tree
    pub fn tree(&self) -> &MpqTree {
        &self.tree
    }

    /// Give up the tree
    pub fn into_tree(self) -> MpqTree {
        self.tree
    }
}
