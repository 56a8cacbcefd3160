//! Nice path decomposition of an interval graph
//!
//! Sweeping the endpoints of an interval model from left to right, a start
//! introduces the vertex and an end forgets it. The resulting path of bags
//! begins at an empty leaf and ends at an empty root, and every bag is the
//! set of intervals alive at one point of the line.

use crate::graph::{Graph, Vertex};
use crate::representation::IntervalRepresentation;
use std::collections::BTreeSet;
use std::fmt;

/// Role of a decomposition node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NiceNodeKind {
    /// First node, empty bag
    Leaf,
    /// Adds a vertex to the bag of the previous node
    Introduce(Vertex),
    /// Drops a vertex from the bag of the previous node
    Forget(Vertex),
    /// Last node, empty bag
    Root,
}

/// Node of the path with its bag
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NiceNode {
    /// Role
    pub kind: NiceNodeKind,
    /// Vertices alive at this node
    pub bag: BTreeSet<Vertex>,
}

/// Path of nice decomposition nodes, leaf first
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NicePathDecomposition {
    nodes: Vec<NiceNode>,
}

impl NicePathDecomposition {
    /// Build the path from an interval model
    pub fn from_representation(rep: &IntervalRepresentation) -> Self {
        let mut events: Vec<(usize, NiceNodeKind)> = Vec::with_capacity(2 * rep.len());
        for (&v, interval) in rep.vertex_to_interval() {
            events.push((interval.start, NiceNodeKind::Introduce(v)));
            events.push((interval.end, NiceNodeKind::Forget(v)));
        }
        events.sort_by_key(|&(coordinate, _)| coordinate);

        let mut nodes = Vec::with_capacity(events.len() + 2);
        let mut bag = BTreeSet::new();
        nodes.push(NiceNode {
            kind: NiceNodeKind::Leaf,
            bag: bag.clone(),
        });
        for (_, kind) in events {
            match kind {
                NiceNodeKind::Introduce(v) => {
                    bag.insert(v);
                }
                NiceNodeKind::Forget(v) => {
                    bag.remove(&v);
                }
                NiceNodeKind::Leaf | NiceNodeKind::Root => {}
            }
            nodes.push(NiceNode {
                kind,
                bag: bag.clone(),
            });
        }
        nodes.push(NiceNode {
            kind: NiceNodeKind::Root,
            bag,
        });

        Self { nodes }
    }

    /// Nodes from leaf to root
    pub fn nodes(&self) -> &[NiceNode] {
        &self.nodes
    }

    /// Largest bag size minus one (0 for graphs without vertices)
    pub fn width(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.bag.len())
            .max()
            .unwrap_or(0)
            .saturating_sub(1)
    }

    /// Check the decomposition against `graph`
    ///
    /// Every bag must be a clique, every edge must sit in some bag and the
    /// bags holding a vertex must be consecutive.
    pub fn is_decomposition_of(&self, graph: &Graph) -> bool {
        if !self.nodes.iter().all(|n| graph.is_clique(&n.bag)) {
            return false;
        }
        let covered = graph
            .edges()
            .all(|(u, v)| self.nodes.iter().any(|n| n.bag.contains(&u) && n.bag.contains(&v)));
        if !covered {
            return false;
        }
        graph.vertices().all(|v| {
            let holding: Vec<usize> = self
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| n.bag.contains(&v))
                .map(|(idx, _)| idx)
                .collect();
            match (holding.first(), holding.last()) {
                (Some(first), Some(last)) => last - first + 1 == holding.len(),
                _ => false,
            }
        })
    }
}

impl fmt::Display for NicePathDecomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            let label = match node.kind {
                NiceNodeKind::Leaf => "leaf".to_string(),
                NiceNodeKind::Introduce(v) => format!("introduce {}", v),
                NiceNodeKind::Forget(v) => format!("forget {}", v),
                NiceNodeKind::Root => "root".to_string(),
            };
            write!(f, "{:<14}", label)?;
            crate::tree::format_bag(f, &node.bag)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_graph_decomposition() {
        let cliques = [BTreeSet::from([1, 2]), BTreeSet::from([2, 3])];
        let rep = IntervalRepresentation::from_cliques(&cliques);
        let dec = NicePathDecomposition::from_representation(&rep);

        assert_eq!(dec.nodes().len(), 2 * 3 + 2);
        assert_eq!(dec.nodes()[0].kind, NiceNodeKind::Leaf);
        assert_eq!(dec.nodes()[1].kind, NiceNodeKind::Introduce(1));
        assert!(dec.nodes().last().unwrap().bag.is_empty());
        assert_eq!(dec.width(), 1);

        let graph = Graph::from_edges([(1, 2), (2, 3)]).unwrap();
        assert!(dec.is_decomposition_of(&graph));

        let mut triangle = graph.clone();
        triangle.add_edge(1, 3).unwrap();
        assert!(!dec.is_decomposition_of(&triangle));
    }
}
