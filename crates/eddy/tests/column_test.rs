use eddy::config::{ColumnOrdering, NodeAlign, SankeyConfig};
use eddy::error::Error;
use eddy::model::{Link, Node, SankeyGraph};
use eddy::{column, cycles};

fn graph(n: usize, edges: &[(usize, usize)]) -> SankeyGraph {
    let mut g = SankeyGraph::default();
    for i in 0..n {
        g.push_node(Node {
            record: Some(i),
            ..Default::default()
        });
    }
    for (i, &(s, t)) in edges.iter().enumerate() {
        let li = g.push_link(Link {
            record: Some(i),
            source: s,
            target: t,
            value: 1.0,
            ..Default::default()
        });
        g.nodes[s].source_links.push(li);
        g.nodes[t].target_links.push(li);
    }
    g
}

fn columns_with(edges: &[(usize, usize)], n: usize, align: NodeAlign) -> Vec<usize> {
    let mut g = graph(n, edges);
    let config = SankeyConfig {
        node_align: align,
        ..Default::default()
    };
    cycles::run(&mut g, &config).unwrap();
    column::run(&mut g, &config).unwrap();
    g.nodes.iter().map(|n| n.column).collect()
}

// a -> b, a -> c, c -> d
const FORK: &[(usize, usize)] = &[(0, 1), (0, 2), (2, 3)];

#[test]
fn column_left_uses_depth() {
    assert_eq!(columns_with(FORK, 4, NodeAlign::Left), vec![0, 1, 1, 2]);
}

#[test]
fn column_right_uses_height() {
    assert_eq!(columns_with(FORK, 4, NodeAlign::Right), vec![0, 2, 1, 2]);
}

#[test]
fn column_justify_moves_sinks_to_last_column() {
    assert_eq!(columns_with(FORK, 4, NodeAlign::Justify), vec![0, 2, 1, 2]);
}

#[test]
fn column_center_pulls_sources_next_to_their_targets() {
    // a -> b -> c, d -> c
    let cols = columns_with(&[(0, 1), (1, 2), (3, 2)], 4, NodeAlign::Center);
    assert_eq!(cols, vec![0, 1, 2, 1]);
}

#[test]
fn column_ignores_circular_links() {
    let mut g = graph(3, &[(0, 1), (1, 2), (2, 0)]);
    let config = SankeyConfig {
        node_align: NodeAlign::Left,
        ..Default::default()
    };
    cycles::run(&mut g, &config).unwrap();
    column::run(&mut g, &config).unwrap();
    let depths: Vec<usize> = g.nodes.iter().map(|n| n.depth).collect();
    let heights: Vec<usize> = g.nodes.iter().map(|n| n.height).collect();
    assert_eq!(depths, vec![0, 1, 2]);
    assert_eq!(heights, vec![2, 1, 0]);
}

#[test]
fn column_reports_unbroken_cycle() {
    let mut g = graph(2, &[(0, 1), (1, 0)]);
    let err = column::run(&mut g, &SankeyConfig::default()).unwrap_err();
    assert!(matches!(err, Error::UnbrokenCycle { .. }));
}

#[test]
fn column_key_mode_ranks_distinct_keys() {
    let mut g = graph(4, &[(0, 1), (1, 3), (2, 3)]);
    for (n, key) in g.nodes.iter_mut().zip([0.0, 1.0, 1.0, 5.0]) {
        n.column_key = Some(key);
    }
    let config = SankeyConfig {
        column_ordering: ColumnOrdering::Key,
        ..Default::default()
    };
    column::run(&mut g, &config).unwrap();
    let cols: Vec<usize> = g.nodes.iter().map(|n| n.column).collect();
    assert_eq!(cols, vec![0, 1, 1, 2]);
    assert_eq!(g.nodes[0].height, 2);
}

#[test]
fn column_key_mode_rejects_missing_key() {
    let mut g = graph(2, &[(0, 1)]);
    g.nodes[1].column_key = Some(3.0);
    let config = SankeyConfig {
        column_ordering: ColumnOrdering::Key,
        ..Default::default()
    };
    let err = column::run(&mut g, &config).unwrap_err();
    match err {
        Error::MissingColumnKey { node } => assert_eq!(node, "#0"),
        other => panic!("unexpected error: {other}"),
    }
}
