//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mpqtree::{Graph, Recognizer, RecognizerConfig};

/// Intersection graph of pseudo-random unit-ish intervals
fn interval_graph(n: usize) -> Graph {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };
    let span = n * 4;
    let intervals: Vec<(usize, usize)> = (0..n)
        .map(|_| {
            let start = next() % span;
            (start, start + 1 + next() % 12)
        })
        .collect();

    let mut graph = Graph::new();
    for (u, &(a_start, a_end)) in intervals.iter().enumerate() {
        graph.add_vertex(u);
        for (v, &(b_start, b_end)) in intervals.iter().enumerate().skip(u + 1) {
            if a_start <= b_end && b_start <= a_end {
                let _ = graph.add_edge(u, v);
            }
        }
    }
    graph
}

/// Path 0 - 1 - ... - n-1
fn long_path(n: usize) -> Graph {
    let mut graph = Graph::new();
    graph.add_vertex(0);
    for v in 1..n {
        let _ = graph.add_edge(v - 1, v);
    }
    graph
}

/// Spine of `n` vertices with three pendants on each
fn caterpillar(n: usize) -> Graph {
    let mut graph = long_path(n);
    for spine in 0..n {
        for leg in 0..3 {
            let _ = graph.add_edge(spine, n + 3 * spine + leg);
        }
    }
    graph
}

fn recognize(graph: &Graph) -> bool {
    Recognizer::new(black_box(graph), RecognizerConfig::default())
        .run()
        .map(|r| r.is_interval_graph())
        .unwrap_or(false)
}

fn benchmark_recognition(c: &mut Criterion) {
    let mut group = c.benchmark_group("recognize_interval_graph");
    for n in [100usize, 400, 1600] {
        let graph = interval_graph(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &graph, |b, graph| {
            b.iter(|| {
                let recognition = Recognizer::new(black_box(graph), RecognizerConfig::default())
                    .run()
                    .map(|r| r.is_interval_graph());
                black_box(recognition)
            });
        });
    }
    group.finish();
}

fn benchmark_sparse_families(c: &mut Criterion) {
    let families: [(&str, fn(usize) -> Graph); 2] =
        [("long_path", long_path), ("caterpillar", caterpillar)];
    for (name, build) in families {
        let mut group = c.benchmark_group(name);
        for n in [1_000usize, 4_000, 16_000] {
            let graph = build(n);
            group.bench_with_input(BenchmarkId::from_parameter(n), &graph, |b, graph| {
                b.iter(|| black_box(recognize(graph)));
            });
        }
        group.finish();
    }
}

criterion_group!(benches, benchmark_recognition, benchmark_sparse_families);
criterion_main!(benches);
