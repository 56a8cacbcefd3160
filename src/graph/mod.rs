//! Simple undirected graphs
//!
//! Vertices are dense `usize` ids; adjacency is kept in ordered sets so that
//! every traversal (and therefore every recognition run) is reproducible.
//! Self-loops are rejected, parallel edges collapse into one.

pub mod chordal;

pub use chordal::{
    inspect, maximum_cardinality_search, Chordality, Hole, PerfectEliminationOrder,
};

use crate::RecognitionError;
use std::collections::{BTreeMap, BTreeSet};

/// Graph vertex identifier
pub type Vertex = usize;

/// Simple undirected graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    adjacency: BTreeMap<Vertex, BTreeSet<Vertex>>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            adjacency: BTreeMap::new(),
        }
    }

    /// Build a graph from an edge list (endpoints are added as vertices)
    pub fn from_edges<I>(edges: I) -> Result<Self, RecognitionError>
    where
        I: IntoIterator<Item = (Vertex, Vertex)>,
    {
        let mut graph = Self::new();
        for (u, v) in edges {
            graph.add_edge(u, v)?;
        }
        Ok(graph)
    }

    /// Add an isolated vertex (no-op if present)
    pub fn add_vertex(&mut self, v: Vertex) {
        self.adjacency.entry(v).or_default();
    }

    /// Add an undirected edge, inserting missing endpoints
    pub fn add_edge(&mut self, u: Vertex, v: Vertex) -> Result<(), RecognitionError> {
        if u == v {
            return Err(RecognitionError::SelfLoop(u));
        }
        self.adjacency.entry(u).or_default().insert(v);
        self.adjacency.entry(v).or_default().insert(u);
        Ok(())
    }

    /// Check whether `v` is a vertex of the graph
    pub fn contains(&self, v: Vertex) -> bool {
        self.adjacency.contains_key(&v)
    }

    /// Check whether `{u, v}` is an edge
    pub fn has_edge(&self, u: Vertex, v: Vertex) -> bool {
        self.adjacency
            .get(&u)
            .map_or(false, |neighbors| neighbors.contains(&v))
    }

    /// Neighbours of `v` in ascending order (empty for unknown vertices)
    pub fn neighbors(&self, v: Vertex) -> impl Iterator<Item = Vertex> + '_ {
        self.adjacency.get(&v).into_iter().flatten().copied()
    }

    /// Degree of `v`
    pub fn degree(&self, v: Vertex) -> usize {
        self.adjacency.get(&v).map_or(0, BTreeSet::len)
    }

    /// Vertices in ascending order
    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.adjacency.keys().copied()
    }

    /// Edges as `(u, v)` with `u < v`, in ascending order
    pub fn edges(&self) -> impl Iterator<Item = (Vertex, Vertex)> + '_ {
        self.adjacency.iter().flat_map(|(&u, neighbors)| {
            neighbors
                .iter()
                .copied()
                .filter(move |&v| u < v)
                .map(move |v| (u, v))
        })
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Check whether every pair of `vertices` is adjacent
    pub fn is_clique<'a, I>(&self, vertices: I) -> bool
    where
        I: IntoIterator<Item = &'a Vertex>,
    {
        let members: Vec<Vertex> = vertices.into_iter().copied().collect();
        members.iter().enumerate().all(|(i, &u)| {
            members[i + 1..].iter().all(|&v| self.has_edge(u, v))
        })
    }

    /// Subgraph induced by `vertices` (unknown ids are ignored)
    pub fn induced<'a, I>(&self, vertices: I) -> Graph
    where
        I: IntoIterator<Item = &'a Vertex>,
    {
        let keep: BTreeSet<Vertex> = vertices
            .into_iter()
            .copied()
            .filter(|v| self.contains(*v))
            .collect();
        let adjacency = keep
            .iter()
            .map(|&v| {
                let neighbors = self
                    .neighbors(v)
                    .filter(|w| keep.contains(w))
                    .collect::<BTreeSet<_>>();
                (v, neighbors)
            })
            .collect();
        Graph { adjacency }
    }
}
