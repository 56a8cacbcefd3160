//! Chordality inspection
//!
//! Maximum cardinality search numbers the vertices so that, for a chordal
//! graph, the neighbours of every vertex that were numbered before it form a
//! clique. That numbering is exactly the insertion order the MPQ-tree needs.
//! When the check fails, a hole (chordless cycle of length >= 4) is extracted
//! as a certificate.

use super::{Graph, Vertex};
use crate::RecognitionError;
use bitvec::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

/// Outcome of a chordality inspection
#[derive(Debug, Clone)]
pub enum Chordality {
    /// Graph is chordal; the order lists every vertex once
    Chordal(PerfectEliminationOrder),
    /// Graph is not chordal; a hole is attached when one could be extracted
    NotChordal(Option<Hole>),
}

impl Chordality {
    /// True for chordal graphs
    pub fn is_chordal(&self) -> bool {
        matches!(self, Chordality::Chordal(_))
    }
}

/// Vertex order in which the earlier neighbours of each vertex form a clique
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfectEliminationOrder {
    order: Vec<Vertex>,
    position: HashMap<Vertex, usize>,
}

impl PerfectEliminationOrder {
    /// Validate a caller-supplied order against `graph`
    ///
    /// The order must list every vertex exactly once and the earlier
    /// neighbours of every vertex must be pairwise adjacent.
    pub fn new(graph: &Graph, order: Vec<Vertex>) -> Result<Self, RecognitionError> {
        if order.len() != graph.vertex_count() {
            return Err(RecognitionError::InvalidOrder(format!(
                "order has {} entries but the graph has {} vertices",
                order.len(),
                graph.vertex_count()
            )));
        }

        let mut position = HashMap::with_capacity(order.len());
        for (idx, &v) in order.iter().enumerate() {
            if !graph.contains(v) {
                return Err(RecognitionError::UnknownVertex(v));
            }
            if position.insert(v, idx).is_some() {
                return Err(RecognitionError::InvalidOrder(format!(
                    "vertex {} appears more than once",
                    v
                )));
            }
        }

        let candidate = Self { order, position };
        if let Some((v, a, b)) = candidate.first_violation(graph) {
            return Err(RecognitionError::InvalidOrder(format!(
                "earlier neighbours {} and {} of vertex {} are not adjacent",
                a, b, v
            )));
        }
        Ok(candidate)
    }

    fn from_search(order: Vec<Vertex>) -> Self {
        let position = order.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        Self { order, position }
    }

    /// Vertices in insertion order
    pub fn vertices(&self) -> &[Vertex] {
        &self.order
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when the order is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Index of `v` in the order
    pub fn position(&self, v: Vertex) -> Option<usize> {
        self.position.get(&v).copied()
    }

    /// Neighbours of `v` that come before it (`Adj⁻(v)`)
    pub fn predecessors(&self, graph: &Graph, v: Vertex) -> BTreeSet<Vertex> {
        let Some(own) = self.position(v) else {
            return BTreeSet::new();
        };
        graph
            .neighbors(v)
            .filter(|w| self.position(*w).map_or(false, |p| p < own))
            .collect()
    }

    /// First vertex whose predecessors are not a clique, with a witnessing pair
    ///
    /// Uses the parent test: the predecessors of `v` other than the latest one
    /// (`p`) must all be adjacent to `p`. By induction over the order this is
    /// equivalent to every predecessor set being a clique.
    fn first_violation(&self, graph: &Graph) -> Option<(Vertex, Vertex, Vertex)> {
        for &v in &self.order {
            let preds = self.predecessors(graph, v);
            let Some(&parent) = preds.iter().max_by_key(|w| self.position[*w]) else {
                continue;
            };
            if let Some(&other) = preds
                .iter()
                .find(|&&w| w != parent && !graph.has_edge(w, parent))
            {
                return Some((v, other, parent));
            }
        }
        None
    }
}

/// Chordless cycle of length at least four
///
/// Stored as a closed walk: the first vertex is repeated at the end, so a
/// 4-cycle lists five vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Hole {
    vertices: Vec<Vertex>,
}

impl Hole {
    /// Closed vertex walk around the cycle
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Number of edges on the cycle
    pub fn cycle_len(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// Check that this is an induced cycle of length >= 4 in `graph`
    pub fn is_hole_of(&self, graph: &Graph) -> bool {
        let n = self.cycle_len();
        if n < 4 || self.vertices.first() != self.vertices.last() {
            return false;
        }
        let cycle = &self.vertices[..n];
        if cycle.iter().collect::<HashSet<_>>().len() != n {
            return false;
        }
        (0..n).all(|i| {
            (i + 1..n).all(|j| {
                let consecutive = j == i + 1 || (i == 0 && j == n - 1);
                graph.has_edge(cycle[i], cycle[j]) == consecutive
            })
        })
    }
}

impl fmt::Display for Hole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.vertices.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", parts.join(" - "))
    }
}

/// Maximum cardinality search
///
/// Repeatedly numbers the unnumbered vertex with the most numbered
/// neighbours; ties go to the smallest id. `start`, when it names a vertex of
/// the graph, is numbered first.
///
/// Vertices wait in buckets by weight; a weight only grows by one per
/// numbered neighbour and the top pointer only drops over empty buckets, so
/// the search is linear in the size of the graph up to the bucket set
/// operations.
pub fn maximum_cardinality_search(graph: &Graph, start: Option<Vertex>) -> Vec<Vertex> {
    // dense indices follow vertex ids, so the smallest index is the smallest id
    let vertices: Vec<Vertex> = graph.vertices().collect();
    let index: HashMap<Vertex, usize> = vertices.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    let n = vertices.len();

    let mut weight = vec![0usize; n];
    let mut numbered = bitvec![0; n];
    let mut buckets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n.max(1)];
    buckets[0] = (0..n).collect();
    let mut top = 0;

    let mut order = Vec::with_capacity(n);
    let mut first = start.and_then(|s| index.get(&s).copied());
    while order.len() < n {
        let next = match first.take() {
            Some(i) => i,
            None => {
                while top > 0 && buckets[top].is_empty() {
                    top -= 1;
                }
                match buckets[top].first() {
                    Some(&i) => i,
                    None => break,
                }
            }
        };

        buckets[weight[next]].remove(&next);
        numbered.set(next, true);
        order.push(vertices[next]);
        for w in graph.neighbors(vertices[next]) {
            let Some(&j) = index.get(&w) else { continue };
            if numbered[j] {
                continue;
            }
            buckets[weight[j]].remove(&j);
            weight[j] += 1;
            buckets[weight[j]].insert(j);
            top = top.max(weight[j]);
        }
    }

    order
}

/// Decide chordality and produce either an order or a hole
pub fn inspect(graph: &Graph) -> Chordality {
    let order = PerfectEliminationOrder::from_search(maximum_cardinality_search(graph, None));
    match order.first_violation(graph) {
        None => Chordality::Chordal(order),
        Some(hint) => Chordality::NotChordal(find_hole(graph, Some(hint))),
    }
}

/// Search for a hole through a vertex `v` and two non-adjacent neighbours
///
/// A shortest `a`-`b` path avoiding the rest of `N[v]` closes an induced
/// cycle with `v`. The hint triple is tried first, then every other triple.
fn find_hole(graph: &Graph, hint: Option<(Vertex, Vertex, Vertex)>) -> Option<Hole> {
    let hinted = hint.into_iter();
    let exhaustive = graph.vertices().flat_map(move |v| {
        let neighbors: Vec<Vertex> = graph.neighbors(v).collect();
        let mut pairs = Vec::new();
        for (i, &a) in neighbors.iter().enumerate() {
            for &b in &neighbors[i + 1..] {
                if !graph.has_edge(a, b) {
                    pairs.push((v, a, b));
                }
            }
        }
        pairs
    });

    hinted
        .chain(exhaustive)
        .find_map(|(v, a, b)| hole_through(graph, v, a, b))
}

fn hole_through(graph: &Graph, v: Vertex, a: Vertex, b: Vertex) -> Option<Hole> {
    let blocked: HashSet<Vertex> = graph
        .neighbors(v)
        .chain(std::iter::once(v))
        .filter(|&w| w != a && w != b)
        .collect();

    let mut previous: HashMap<Vertex, Vertex> = HashMap::new();
    let mut queue = VecDeque::from([a]);
    previous.insert(a, a);

    while let Some(x) = queue.pop_front() {
        if x == b {
            break;
        }
        for y in graph.neighbors(x) {
            if blocked.contains(&y) || previous.contains_key(&y) {
                continue;
            }
            previous.insert(y, x);
            queue.push_back(y);
        }
    }

    if !previous.contains_key(&b) {
        return None;
    }

    let mut path = vec![b];
    let mut cursor = b;
    while cursor != a {
        cursor = previous[&cursor];
        path.push(cursor);
    }
    path.reverse();

    let mut vertices = Vec::with_capacity(path.len() + 2);
    vertices.push(v);
    vertices.extend(path);
    vertices.push(v);
    Some(Hole { vertices })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(n: usize) -> Graph {
        Graph::from_edges((0..n).map(|i| (i, (i + 1) % n))).unwrap()
    }

    #[test]
    fn test_mcs_visits_every_vertex_once() {
        let mut graph = cycle(6);
        graph.add_vertex(42);
        let order = maximum_cardinality_search(&graph, Some(3));

        assert_eq!(order.len(), 7);
        assert_eq!(order[0], 3);
        assert_eq!(order.iter().collect::<BTreeSet<_>>().len(), 7);
    }

    #[test]
    fn test_mcs_prefers_weight_then_smallest_id() {
        let graph = Graph::from_edges([(5, 1), (5, 2), (1, 2), (3, 4)]).unwrap();
        assert_eq!(maximum_cardinality_search(&graph, None), vec![1, 2, 5, 3, 4]);

        let path = Graph::from_edges([(1, 2), (2, 3), (3, 4), (4, 5)]).unwrap();
        assert_eq!(maximum_cardinality_search(&path, Some(3)), vec![3, 2, 1, 4, 5]);
        assert_eq!(maximum_cardinality_search(&path, Some(9)), vec![1, 2, 3, 4, 5]);
        assert!(maximum_cardinality_search(&Graph::new(), None).is_empty());
    }

    #[test]
    fn test_mcs_on_a_long_path() {
        let edges: Vec<(Vertex, Vertex)> = (0..20_000).map(|v| (v, v + 1)).collect();
        let graph = Graph::from_edges(edges).unwrap();
        let order = maximum_cardinality_search(&graph, None);
        assert_eq!(order, (0..=20_000).collect::<Vec<_>>());
    }

    #[test]
    fn test_chordal_graph_yields_order() {
        // Two triangles sharing an edge plus a pendant vertex
        let graph = Graph::from_edges([(1, 2), (2, 3), (1, 3), (2, 4), (3, 4), (4, 5)]).unwrap();
        let Chordality::Chordal(order) = inspect(&graph) else {
            panic!("graph is chordal");
        };

        for &v in order.vertices() {
            let preds = order.predecessors(&graph, v);
            assert!(graph.is_clique(&preds), "predecessors of {} must be a clique", v);
        }
    }

    #[test]
    fn test_cycle_yields_hole() {
        let graph = cycle(5);
        let Chordality::NotChordal(Some(hole)) = inspect(&graph) else {
            panic!("C5 is not chordal");
        };
        assert_eq!(hole.cycle_len(), 5);
        assert!(hole.is_hole_of(&graph));
    }

    #[test]
    fn test_supplied_order_is_validated() {
        let graph = Graph::from_edges([(1, 2), (2, 3)]).unwrap();

        assert!(PerfectEliminationOrder::new(&graph, vec![1, 2, 3]).is_ok());
        // 1 and 3 both precede 2 but are not adjacent
        assert!(matches!(
            PerfectEliminationOrder::new(&graph, vec![1, 3, 2]),
            Err(RecognitionError::InvalidOrder(_))
        ));
        assert!(matches!(
            PerfectEliminationOrder::new(&graph, vec![1, 2]),
            Err(RecognitionError::InvalidOrder(_))
        ));
        assert!(matches!(
            PerfectEliminationOrder::new(&graph, vec![1, 2, 9]),
            Err(RecognitionError::UnknownVertex(9))
        ));
    }
}
