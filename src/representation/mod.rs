//! Interval model read off a finished MPQ-tree
//!
//! The leaf cliques of the tree, in frontier order, form a clique path: every
//! vertex occupies a consecutive run of cliques. Sweeping the cliques left to
//! right and handing out increasing integer coordinates (first the vertices
//! that start at the clique, then those that end there) gives closed
//! intervals with pairwise distinct endpoints that intersect exactly when the
//! vertices share a clique.

use crate::graph::{Graph, Vertex};
use crate::tree::{InvariantViolation, MpqTree};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Closed integer interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Interval {
    /// Left endpoint
    pub start: usize,
    /// Right endpoint
    pub end: usize,
}

impl Interval {
    /// Interval over `start..=end`
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "interval must not be empty");
        Self { start, end }
    }

    /// Check whether `point` lies inside
    pub fn contains(&self, point: usize) -> bool {
        self.start <= point && point <= self.end
    }

    /// Check whether the two intervals share a point
    pub fn intersects(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Interval model of an interval graph
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IntervalRepresentation {
    intervals: BTreeMap<Vertex, Interval>,
    owners: BTreeMap<Interval, Vertex>,
    by_start: Vec<Interval>,
    by_end: Vec<Interval>,
}

impl IntervalRepresentation {
    /// Model built from the leaf cliques of `tree`
    pub fn from_tree(tree: &MpqTree) -> Result<Self, InvariantViolation> {
        Ok(Self::from_cliques(&tree.cliques()?))
    }

    /// Model built from a clique path
    ///
    /// Each vertex is stretched from its first to its last clique; when the
    /// cliques containing a vertex are not consecutive the model is not
    /// faithful, which `first_mismatch` reports.
    pub fn from_cliques(cliques: &[BTreeSet<Vertex>]) -> Self {
        let mut last_seen: HashMap<Vertex, usize> = HashMap::new();
        for (idx, clique) in cliques.iter().enumerate() {
            for &v in clique {
                last_seen.insert(v, idx);
            }
        }

        let mut starts: HashMap<Vertex, usize> = HashMap::with_capacity(last_seen.len());
        let mut intervals = BTreeMap::new();
        let mut coordinate = 0;
        for (idx, clique) in cliques.iter().enumerate() {
            for &v in clique {
                if let Entry::Vacant(slot) = starts.entry(v) {
                    slot.insert(coordinate);
                    coordinate += 1;
                }
            }
            for &v in clique {
                if last_seen[&v] == idx {
                    intervals.insert(v, Interval::new(starts[&v], coordinate));
                    coordinate += 1;
                }
            }
        }

        Self::from_intervals(intervals)
    }

    fn from_intervals(intervals: BTreeMap<Vertex, Interval>) -> Self {
        let owners = intervals.iter().map(|(&v, &i)| (i, v)).collect();
        let mut by_start: Vec<Interval> = intervals.values().copied().collect();
        let mut by_end = by_start.clone();
        by_start.sort_by_key(|i| (i.start, i.end));
        by_end.sort_by_key(|i| (i.end, i.start));
        Self {
            intervals,
            owners,
            by_start,
            by_end,
        }
    }

    /// Interval of `v`
    pub fn interval(&self, v: Vertex) -> Option<Interval> {
        self.intervals.get(&v).copied()
    }

    /// Vertex whose interval is `interval`
    pub fn vertex(&self, interval: &Interval) -> Option<Vertex> {
        self.owners.get(interval).copied()
    }

    /// Vertex to interval map
    pub fn vertex_to_interval(&self) -> &BTreeMap<Vertex, Interval> {
        &self.intervals
    }

    /// Interval to vertex map
    pub fn interval_to_vertex(&self) -> &BTreeMap<Interval, Vertex> {
        &self.owners
    }

    /// Intervals by increasing left endpoint
    pub fn sorted_by_start(&self) -> &[Interval] {
        &self.by_start
    }

    /// Intervals by increasing right endpoint
    pub fn sorted_by_end(&self) -> &[Interval] {
        &self.by_end
    }

    /// Number of intervals
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// True for the model of the empty graph
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// First pair on which the model and `graph` disagree
    ///
    /// Yields `(v, v)` for a vertex present on one side only, otherwise a
    /// pair whose adjacency differs from interval intersection.
    pub fn first_mismatch(&self, graph: &Graph) -> Option<(Vertex, Vertex)> {
        if let Some(v) = graph.vertices().find(|v| !self.intervals.contains_key(v)) {
            return Some((v, v));
        }
        if let Some(&v) = self.intervals.keys().find(|v| !graph.contains(**v)) {
            return Some((v, v));
        }

        let entries: Vec<(Vertex, Interval)> =
            self.intervals.iter().map(|(&v, &i)| (v, i)).collect();
        for (idx, &(u, a)) in entries.iter().enumerate() {
            for &(v, b) in &entries[idx + 1..] {
                if a.intersects(&b) != graph.has_edge(u, v) {
                    return Some((u, v));
                }
            }
        }
        None
    }

    /// True when intersection of intervals is exactly adjacency in `graph`
    pub fn is_model_of(&self, graph: &Graph) -> bool {
        self.first_mismatch(graph).is_none()
    }
}
