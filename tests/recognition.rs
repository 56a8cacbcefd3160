mod common;

use common::{complete, cycle, from_intervals, path, random_intervals, subdivided_claw, sun3};
use mpqtree::{
    Graph, NicePathDecomposition, Recognition, RecognitionError, Recognizer, RecognizerConfig,
    Witness,
};
use test_case::test_case;

fn recognize(graph: &Graph) -> Recognition {
    Recognizer::new(graph, RecognizerConfig::strict())
        .run()
        .expect("recognition completes")
}

#[test_case(path(1) ; "single vertex")]
#[test_case(path(2) ; "single edge")]
#[test_case(path(7) ; "path on seven vertices")]
#[test_case(complete(5) ; "complete graph")]
#[test_case(from_intervals(&[(0, 4), (1, 2), (3, 6), (5, 9), (7, 8), (8, 12)]) ; "hand-made interval model")]
#[test_case(from_intervals(&random_intervals(7, 40, 100)) ; "random interval model")]
#[test_case(Graph::from_edges([(1, 2), (3, 4), (5, 6)]).unwrap() ; "disjoint edges")]
fn interval_families_are_accepted(graph: Graph) {
    let recognition = recognize(&graph);
    let rep = recognition.representation().expect("interval graph");
    assert!(rep.is_model_of(&graph));
}

#[test_case(sun3() ; "3-sun")]
#[test_case(subdivided_claw() ; "subdivided claw")]
fn chordal_non_interval_graphs_are_rejected(graph: Graph) {
    let Recognition::NotIntervalGraph { witness, rejection } = recognize(&graph) else {
        panic!("graph must be rejected");
    };
    assert!(witness.is_none(), "chordal graphs carry no hole");
    let rejection = rejection.expect("rejection is reported");
    assert!(graph.contains(rejection.vertex));
}

#[test_case(4)]
#[test_case(5)]
#[test_case(8)]
fn cycles_are_rejected_with_a_hole(n: usize) {
    let graph = cycle(n);
    let Recognition::NotIntervalGraph {
        witness: Some(Witness::Hole(hole)),
        rejection,
    } = recognize(&graph)
    else {
        panic!("C{} is not chordal", n);
    };
    assert_eq!(hole.cycle_len(), n);
    assert!(hole.is_hole_of(&graph));
    assert!(rejection.is_none(), "no tree is built for non-chordal input");
}

#[test]
fn path_with_reverse_bfs_order() {
    let graph = path(5);
    let recognition = Recognizer::new(&graph, RecognizerConfig::strict())
        .run_with_order(vec![5, 4, 3, 2, 1])
        .expect("order is valid");

    let rep = recognition.representation().expect("paths are interval graphs");
    for u in 1..=5 {
        for v in u + 1..=5 {
            let a = rep.interval(u).expect("every vertex has an interval");
            let b = rep.interval(v).expect("every vertex has an interval");
            assert_eq!(a.intersects(&b), v == u + 1, "intervals of {} and {}", u, v);
        }
    }
}

#[test]
fn five_cycle_with_one_chord() {
    let mut graph = cycle(5);
    graph.add_edge(1, 3).unwrap();

    let Recognition::NotIntervalGraph {
        witness: Some(Witness::Hole(hole)),
        ..
    } = recognize(&graph)
    else {
        panic!("the chord leaves a 4-hole");
    };
    assert_eq!(hole.vertices().len(), 5);
    assert_eq!(hole.vertices().first(), hole.vertices().last());
    assert!(hole.is_hole_of(&graph));
}

#[test]
fn supplied_order_must_be_perfect() {
    let graph = path(3);
    let recognizer = Recognizer::new(&graph, RecognizerConfig::default());

    assert!(matches!(
        recognizer.run_with_order(vec![1, 3, 2]),
        Err(RecognitionError::InvalidOrder(_))
    ));
    assert!(matches!(
        recognizer.run_with_order(vec![1, 2]),
        Err(RecognitionError::InvalidOrder(_))
    ));
    assert!(matches!(
        recognizer.run_with_order(vec![1, 2, 9]),
        Err(RecognitionError::UnknownVertex(9))
    ));
}

#[test]
fn decomposition_of_recognized_graph() {
    let graph = from_intervals(&random_intervals(11, 25, 60));
    let recognition = recognize(&graph);
    let rep = recognition.representation().expect("interval graph");

    let decomposition = NicePathDecomposition::from_representation(rep);
    assert_eq!(decomposition.nodes().len(), 2 * graph.vertex_count() + 2);
    assert!(decomposition.is_decomposition_of(&graph));

    let largest = common::maximal_cliques(&graph)
        .iter()
        .map(|c| c.len())
        .max()
        .unwrap_or(0);
    assert_eq!(decomposition.width(), largest - 1);
}
