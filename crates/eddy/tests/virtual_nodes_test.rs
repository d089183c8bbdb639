use eddy::config::SankeyConfig;
use eddy::model::{Link, LinkKind, Node, SankeyGraph};
use eddy::{column, cycles, virtual_nodes};

fn graph(n: usize, edges: &[(usize, usize, f64)]) -> SankeyGraph {
    let mut g = SankeyGraph::default();
    for i in 0..n {
        g.push_node(Node {
            record: Some(i),
            ..Default::default()
        });
    }
    for (i, &(s, t, value)) in edges.iter().enumerate() {
        let li = g.push_link(Link {
            record: Some(i),
            source: s,
            target: t,
            value,
            ..Default::default()
        });
        g.nodes[s].source_links.push(li);
        g.nodes[t].target_links.push(li);
    }
    eddy::bind::compute_node_values(&mut g);
    g
}

/// a -> b -> c plus the long link a -> c.
fn skip_graph(config: &SankeyConfig) -> SankeyGraph {
    let mut g = graph(3, &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 4.0)]);
    cycles::run(&mut g, config).unwrap();
    column::run(&mut g, config).unwrap();
    virtual_nodes::run(&mut g, config);
    g
}

#[test]
fn virtual_nodes_split_long_links_into_one_column_legs() {
    let g = skip_graph(&SankeyConfig::default());

    assert_eq!(g.nodes.len(), 4);
    let waypoint = &g.nodes[3];
    assert!(waypoint.is_virtual());
    assert_eq!(waypoint.virtual_of, Some(2));
    assert_eq!(waypoint.column, 1);
    assert_eq!(waypoint.value, 4.0);

    assert_eq!(
        g.links[2].kind,
        LinkKind::Replaced {
            legs: vec![3, 4],
            waypoints: vec![3],
        }
    );
    assert_eq!((g.links[3].source, g.links[3].target), (0, 3));
    assert_eq!((g.links[4].source, g.links[4].target), (3, 2));
    assert!(g.links[3].is_virtual() && g.links[4].is_virtual());
    assert_eq!(g.links[4].value, 4.0);

    assert_eq!(g.nodes[0].source_links, vec![0, 3]);
    assert_eq!(g.nodes[2].target_links, vec![1, 4]);
    assert!(g.active_links().all(|l| g.column_span(l.index) <= 1));
}

#[test]
fn virtual_nodes_undo_restores_adjacency_and_ports() {
    let mut g = skip_graph(&SankeyConfig::default());
    g.scale = 2.0;
    g.links[3].y0 = 17.0;
    g.links[4].y1 = 42.0;

    virtual_nodes::undo(&mut g);

    assert_eq!(g.nodes[0].source_links, vec![0, 2]);
    assert_eq!(g.nodes[2].target_links, vec![1, 2]);
    assert_eq!(g.links[2].y0, 17.0);
    assert_eq!(g.links[2].y1, 42.0);
    assert_eq!(g.links[2].width, 8.0);
    // The chain stays available for output and path stitching.
    assert!(g.links[2].is_replaced());
    assert_eq!(g.nodes.len(), 4);
}

#[test]
fn virtual_nodes_can_be_disabled() {
    let config = SankeyConfig {
        virtual_nodes: false,
        ..Default::default()
    };
    let g = skip_graph(&config);
    assert_eq!(g.nodes.len(), 3);
    assert_eq!(g.links.len(), 3);
    assert_eq!(g.links[2].kind, LinkKind::Real);
}

#[test]
fn virtual_nodes_leave_circular_links_alone() {
    // a -> b -> c -> d, d -> a spans three columns backwards.
    let mut g = graph(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)]);
    let config = SankeyConfig::default();
    cycles::run(&mut g, &config).unwrap();
    column::run(&mut g, &config).unwrap();
    virtual_nodes::run(&mut g, &config);
    assert!(g.links[3].circular);
    assert_eq!(g.links[3].kind, LinkKind::Real);
    assert_eq!(g.nodes.len(), 4);
}
