mod common;

use common::path;
use mpqtree::{Graph, IntervalRepresentation, Recognizer, RecognizerConfig};
use test_case::test_case;

/// Spine 1 - ... - n with `legs` pendant vertices on every spine vertex
fn caterpillar(n: usize, legs: usize) -> Graph {
    let mut graph = path(n);
    let mut next = n + 1;
    for spine in 1..=n {
        for _ in 0..legs {
            graph.add_edge(spine, next).expect("pendant edge");
            next += 1;
        }
    }
    graph
}

/// Exact model check in `O(n log n + m)`: every edge intersects and the
/// number of intersecting pairs equals the edge count
fn models_exactly(rep: &IntervalRepresentation, graph: &Graph) -> bool {
    let intervals = rep.vertex_to_interval();
    if intervals.len() != graph.vertex_count() {
        return false;
    }
    let edges_intersect = graph.edges().all(|(u, v)| match (intervals.get(&u), intervals.get(&v)) {
        (Some(a), Some(b)) => a.intersects(b),
        _ => false,
    });

    let starts: Vec<usize> = rep.sorted_by_start().iter().map(|i| i.start).collect();
    let pairs: usize = rep
        .sorted_by_start()
        .iter()
        .enumerate()
        .map(|(idx, i)| starts.partition_point(|&s| s <= i.end) - idx - 1)
        .sum();

    edges_intersect && pairs == graph.edge_count()
}

#[test_case(path(20_000) ; "long path")]
#[test_case(caterpillar(2_000, 3) ; "caterpillar")]
#[test_case(caterpillar(5_000, 1) ; "comb")]
fn large_interval_graphs_are_accepted(graph: Graph) {
    let recognition = Recognizer::new(&graph, RecognizerConfig::default())
        .run()
        .expect("recognition completes");
    let rep = recognition.representation().expect("interval graph");
    assert_eq!(rep.len(), graph.vertex_count());
    assert!(models_exactly(rep, &graph));
}

#[test]
fn exact_model_check_catches_a_missing_edge() {
    let graph = path(6);
    let rep = Recognizer::new(&graph, RecognizerConfig::default())
        .run()
        .unwrap()
        .representation()
        .cloned()
        .unwrap();

    let mut denser = path(6);
    denser.add_edge(1, 6).unwrap();
    assert!(models_exactly(&rep, &graph));
    assert!(!models_exactly(&rep, &denser));
}
