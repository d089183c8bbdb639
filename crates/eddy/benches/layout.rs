use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use eddy::{LinkData, NodeData, SankeyConfig};
use std::hint::black_box;
use std::time::Duration;

#[derive(Debug, Clone)]
struct GraphSpec {
    nodes: Vec<NodeData>,
    links: Vec<LinkData>,
}

fn build_cyclic_spec(name: &str, node_count: usize, back_every: usize) -> GraphSpec {
    let ids: Vec<String> = (0..node_count).map(|i| format!("{name}_n{i}")).collect();
    let mut links: Vec<LinkData> = Vec::new();
    let mut link = |from: usize, to: usize, value: f64| {
        links.push(LinkData::new(ids[from].clone(), ids[to].clone(), value));
    };

    // A spine to guarantee connectivity.
    for i in 0..node_count.saturating_sub(1) {
        link(i, i + 1, 10.0 + (i % 7) as f64);
    }
    for i in 0..node_count {
        // Skip links spanning two and three columns exercise the virtual chains.
        if i + 2 < node_count {
            link(i, i + 2, 3.0);
        }
        if i % 4 == 0 && i + 3 < node_count {
            link(i, i + 3, 1.5);
        }
        // Back links close cycles of varying spans; every eleventh node loops on itself.
        if i % back_every == back_every - 1 && i >= 4 {
            link(i, i - 1 - (i % 4), 2.0);
        }
        if i % 11 == 5 {
            link(i, i, 1.0);
        }
    }

    GraphSpec {
        nodes: ids.into_iter().map(NodeData::new).collect(),
        links,
    }
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("sankey_layout");
    group.measurement_time(Duration::from_secs(10));

    let cases = [
        ("cyclic_20_b5", 20usize, 5usize),
        ("cyclic_60_b7", 60usize, 7usize),
        ("cyclic_150_b9", 150usize, 9usize),
    ];
    let config = SankeyConfig {
        width: 1600.0,
        height: 900.0,
        ..Default::default()
    };

    for (name, nodes, back_every) in cases {
        let spec = build_cyclic_spec(name, nodes, back_every);
        group.bench_with_input(BenchmarkId::new("layout", name), &spec, |b, spec| {
            b.iter(|| {
                let layout = eddy::layout(black_box(&spec.nodes), &spec.links, &config)
                    .expect("layout");
                black_box(layout.links.len());
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
