#![allow(dead_code)]

use std::collections::BTreeSet;

use mpqtree::{Graph, Vertex};

/// Path 1 - 2 - ... - n
pub fn path(n: usize) -> Graph {
    let mut graph = Graph::from_edges((1..n).map(|i| (i, i + 1))).expect("path edges");
    for v in 1..=n {
        graph.add_vertex(v);
    }
    graph
}

/// Complete graph on 1..=n
pub fn complete(n: usize) -> Graph {
    let mut graph = Graph::new();
    for u in 1..=n {
        graph.add_vertex(u);
        for v in u + 1..=n {
            graph.add_edge(u, v).expect("complete edges");
        }
    }
    graph
}

/// Cycle 1 - 2 - ... - n - 1
pub fn cycle(n: usize) -> Graph {
    Graph::from_edges((1..=n).map(|i| (i, i % n + 1))).expect("cycle edges")
}

/// Intersection graph of closed intervals; vertex `i` owns `intervals[i]`
pub fn from_intervals(intervals: &[(u32, u32)]) -> Graph {
    let mut graph = Graph::new();
    for (u, &(a_start, a_end)) in intervals.iter().enumerate() {
        graph.add_vertex(u);
        for (v, &(b_start, b_end)) in intervals.iter().enumerate().skip(u + 1) {
            if a_start <= b_end && b_start <= a_end {
                graph.add_edge(u, v).expect("interval edges");
            }
        }
    }
    graph
}

/// 3-sun: triangle 1 2 3 with one extra vertex on each of its edges
///
/// Chordal, but 4, 5 and 6 form an asteroidal triple.
pub fn sun3() -> Graph {
    Graph::from_edges([
        (1, 2),
        (2, 3),
        (1, 3),
        (4, 1),
        (4, 2),
        (5, 2),
        (5, 3),
        (6, 1),
        (6, 3),
    ])
    .expect("sun edges")
}

/// Tree with three rays of length two around vertex 0
pub fn subdivided_claw() -> Graph {
    Graph::from_edges([(0, 1), (1, 2), (0, 3), (3, 4), (0, 5), (5, 6)]).expect("claw edges")
}

/// Deterministic pseudo-random closed intervals over `0..span`
pub fn random_intervals(seed: u64, n: usize, span: u32) -> Vec<(u32, u32)> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as u32
    };
    (0..n)
        .map(|_| {
            let start = next() % span;
            let len = next() % (span / 4).max(1);
            (start, start + len)
        })
        .collect()
}

/// Every maximal clique, by Bron-Kerbosch with pivoting
pub fn maximal_cliques(graph: &Graph) -> Vec<BTreeSet<Vertex>> {
    let mut cliques = Vec::new();
    bron_kerbosch(
        graph,
        BTreeSet::new(),
        graph.vertices().collect(),
        BTreeSet::new(),
        &mut cliques,
    );
    cliques.sort();
    cliques
}

fn bron_kerbosch(
    graph: &Graph,
    current: BTreeSet<Vertex>,
    mut candidates: BTreeSet<Vertex>,
    mut excluded: BTreeSet<Vertex>,
    out: &mut Vec<BTreeSet<Vertex>>,
) {
    if candidates.is_empty() {
        if excluded.is_empty() {
            out.push(current);
        }
        return;
    }

    let pivot = candidates
        .iter()
        .chain(excluded.iter())
        .copied()
        .max_by_key(|&p| candidates.iter().filter(|&&c| graph.has_edge(p, c)).count())
        .expect("candidates are not empty");
    let branch: Vec<Vertex> = candidates
        .iter()
        .copied()
        .filter(|&c| !graph.has_edge(pivot, c))
        .collect();

    for v in branch {
        let neighbors: BTreeSet<Vertex> = graph.neighbors(v).collect();
        let mut next = current.clone();
        next.insert(v);
        bron_kerbosch(
            graph,
            next,
            candidates.intersection(&neighbors).copied().collect(),
            excluded.intersection(&neighbors).copied().collect(),
            out,
        );
        candidates.remove(&v);
        excluded.insert(v);
    }
}

/// Brute-force interval test: can the maximal cliques be lined up so that
/// every vertex occupies consecutive cliques?
pub fn is_interval_oracle(graph: &Graph) -> bool {
    let cliques = maximal_cliques(graph);
    let mut used = vec![false; cliques.len()];
    extend_clique_path(&cliques, &mut used, &BTreeSet::new(), &BTreeSet::new(), 0)
}

fn extend_clique_path(
    cliques: &[BTreeSet<Vertex>],
    used: &mut [bool],
    open: &BTreeSet<Vertex>,
    closed: &BTreeSet<Vertex>,
    placed: usize,
) -> bool {
    if placed == cliques.len() {
        return true;
    }
    for idx in 0..cliques.len() {
        if used[idx] {
            continue;
        }
        let clique = &cliques[idx];
        if clique.iter().any(|v| closed.contains(v)) {
            continue;
        }
        let mut next_closed = closed.clone();
        next_closed.extend(open.difference(clique).copied());

        used[idx] = true;
        if extend_clique_path(cliques, used, clique, &next_closed, placed + 1) {
            return true;
        }
        used[idx] = false;
    }
    false
}

/// Graph on 0..n whose edges are picked by `bits` in lexicographic pair order
pub fn graph_from_bits(n: usize, bits: &[bool]) -> Graph {
    let mut graph = Graph::new();
    let mut bit = bits.iter().copied();
    for u in 0..n {
        graph.add_vertex(u);
        for v in u + 1..n {
            if bit.next().unwrap_or(false) {
                graph.add_edge(u, v).expect("generated edges");
            }
        }
    }
    graph
}
