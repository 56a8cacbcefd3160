//! # Interval Graph Recognition on Modified PQ-Trees
//!
//! This library decides whether a simple undirected graph is an interval
//! graph, following Korte and Möhring's incremental MPQ-tree algorithm, and
//! returns an interval model when it is.
//!
//! ## Pipeline
//!
//! 1. **Chordality gate**: maximum cardinality search yields an insertion
//!    order, or a hole proving the graph is not chordal
//! 2. **Labeling**: the earlier neighbours of the next vertex are counted
//!    node by node up the tree
//! 3. **Validation**: the labelled root path is checked and a template is
//!    chosen for every node between `nSmall` and `nBig`
//! 4. **Rewriting**: the templates are applied; the tree now represents
//!    the maximal cliques of the graph seen so far
//!
//! After the last vertex the leaf cliques, read in frontier order, give the
//! interval model.
//!
//! ## Usage Example
//!
//! ```
//! use mpqtree::{Graph, Recognizer, RecognizerConfig};
//!
//! let graph = Graph::from_edges([(1, 2), (2, 3), (3, 4)]).unwrap();
//! let recognition = Recognizer::new(&graph, RecognizerConfig::default())
//!     .run()
//!     .unwrap();
//! assert!(recognition.is_interval_graph());
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod graph; // Graphs and the chordality gate
pub mod tree; // MPQ-tree store
pub mod labeling; // Predecessor counts per node
pub mod validate; // Root path check and template choice
pub mod template; // Tree rewriting
pub mod incremental; // One vertex at a time
pub mod representation; // Interval model
pub mod decomposition; // Nice path decomposition

// Re-exports for convenience
pub use decomposition::{NiceNode, NiceNodeKind, NicePathDecomposition};
pub use graph::{Chordality, Graph, Hole, PerfectEliminationOrder, Vertex};
pub use incremental::{IncrementalRecognizer, Insertion};
pub use representation::{Interval, IntervalRepresentation};
pub use tree::{InvariantViolation, MpqTree, NodeId};
pub use validate::{Obstruction, PathPlan, Template};

use thiserror::Error;
use tracing::{debug, info};

/// Recognition driver
///
/// Runs the chordality gate, then feeds the vertices to an
/// [`IncrementalRecognizer`] in insertion order.
#[derive(Debug)]
pub struct Recognizer<'g> {
    graph: &'g Graph,
    config: RecognizerConfig,
}

/// Checks run alongside recognition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizerConfig {
    /// Run the full tree consistency check after every vertex
    pub verify_invariants: bool,

    /// Compare the final interval model against the graph
    pub verify_representation: bool,
}

impl RecognizerConfig {
    /// Configuration with every check enabled
    pub fn strict() -> Self {
        Self {
            verify_invariants: true,
            verify_representation: true,
        }
    }

    /// Toggle the per-vertex consistency check
    pub fn with_verify_invariants(mut self, enabled: bool) -> Self {
        self.verify_invariants = enabled;
        self
    }

    /// Toggle the final model check
    pub fn with_verify_representation(mut self, enabled: bool) -> Self {
        self.verify_representation = enabled;
        self
    }
}

/// Outcome of recognition
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Recognition {
    /// Graph is an interval graph
    IntervalGraph(IntervalRepresentation),

    /// Graph is not an interval graph
    NotIntervalGraph {
        /// Induced subgraph proving it, when one is known
        witness: Option<Witness>,
        /// Where the tree refused a vertex (absent for non-chordal input)
        rejection: Option<Rejection>,
    },
}

impl Recognition {
    /// True for interval graphs
    pub fn is_interval_graph(&self) -> bool {
        matches!(self, Recognition::IntervalGraph(_))
    }

    /// Interval model, if any
    pub fn representation(&self) -> Option<&IntervalRepresentation> {
        match self {
            Recognition::IntervalGraph(rep) => Some(rep),
            Recognition::NotIntervalGraph { .. } => None,
        }
    }
}

/// Certificate that a graph is not an interval graph
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Witness {
    /// Chordless cycle of length at least four
    Hole(Hole),
}

/// Vertex the tree could not take
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rejection {
    /// Rejected vertex
    pub vertex: Vertex,
    /// What blocked it
    pub obstruction: Obstruction,
}

/// Errors that can occur during recognition
///
/// A graph that is not an interval graph is a regular [`Recognition`], not
/// an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// Edge from a vertex to itself
    #[error("self-loop on vertex {0}")]
    SelfLoop(Vertex),

    /// Vertex not in the graph
    #[error("vertex {0} is not in the graph")]
    UnknownVertex(Vertex),

    /// Supplied vertex order cannot drive the recognition
    #[error("invalid vertex order: {0}")]
    InvalidOrder(String),

    /// Internal fault: the tree broke one of its invariants
    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl<'g> Recognizer<'g> {
    /// Create a recognizer over `graph`
    pub fn new(graph: &'g Graph, config: RecognizerConfig) -> Self {
        Self { graph, config }
    }

    /// Recognize using an order computed by maximum cardinality search
    ///
    /// Non-chordal graphs are answered from the hole alone; no tree is
    /// built for them.
    pub fn run(&self) -> Result<Recognition, RecognitionError> {
        match graph::inspect(self.graph) {
            Chordality::NotChordal(hole) => {
                info!(
                    vertices = self.graph.vertex_count(),
                    hole = hole.as_ref().map(|h| h.cycle_len()),
                    "graph is not chordal"
                );
                Ok(Recognition::NotIntervalGraph {
                    witness: hole.map(Witness::Hole),
                    rejection: None,
                })
            }
            Chordality::Chordal(order) => self.recognize(&order),
        }
    }

    /// Recognize using a caller-supplied insertion order
    ///
    /// The earlier neighbours of every vertex must form a clique; the order
    /// is checked before any tree is built.
    pub fn run_with_order(&self, order: Vec<Vertex>) -> Result<Recognition, RecognitionError> {
        let order = PerfectEliminationOrder::new(self.graph, order)?;
        self.recognize(&order)
    }

    fn recognize(&self, order: &PerfectEliminationOrder) -> Result<Recognition, RecognitionError> {
        let mut recognizer = IncrementalRecognizer::new();

        for &u in order.vertices() {
            let predecessors = order.predecessors(self.graph, u);
            match recognizer.insert(u, &predecessors)? {
                Insertion::Inserted(plan) => {
                    debug!(vertex = u, steps = plan.steps().len(), "vertex inserted");
                }
                Insertion::Rejected(obstruction) => {
                    info!(vertex = u, %obstruction, "graph is chordal but not an interval graph");
                    return Ok(Recognition::NotIntervalGraph {
                        witness: None,
                        rejection: Some(Rejection {
                            vertex: u,
                            obstruction,
                        }),
                    });
                }
            }
            if self.config.verify_invariants {
                recognizer.tree().check_consistency()?;
            }
        }

        let tree = recognizer.into_tree();
        let representation = IntervalRepresentation::from_tree(&tree)?;
        if self.config.verify_representation {
            if let Some((first, second)) = representation.first_mismatch(self.graph) {
                return Err(InvariantViolation::RepresentationMismatch { first, second }.into());
            }
        }

        info!(
            vertices = representation.len(),
            nodes = tree.node_count(),
            "graph is an interval graph"
        );
        Ok(Recognition::IntervalGraph(representation))
    }
}
