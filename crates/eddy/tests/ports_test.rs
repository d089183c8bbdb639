use eddy::{Band, LinkData, LinkLayout, NodeData, NodeLayout, SankeyConfig, SankeyLayout};

const EPS: f64 = 1e-6;

fn nodes(ids: &[&str]) -> Vec<NodeData> {
    ids.iter().map(|id| NodeData::new(*id)).collect()
}

fn node<'a>(layout: &'a SankeyLayout<String>, id: &str) -> &'a NodeLayout<String> {
    layout.nodes.iter().find(|n| n.id == id).unwrap()
}

fn link<'a>(layout: &'a SankeyLayout<String>, s: &str, t: &str) -> &'a LinkLayout<String> {
    layout
        .links
        .iter()
        .find(|l| l.source == s && l.target == t)
        .unwrap()
}

#[test]
fn ports_tile_each_node_edge_contiguously() {
    let layout = eddy::layout(
        &nodes(&["a", "b", "c", "d"]),
        &[
            LinkData::new("a", "b", 3.0),
            LinkData::new("a", "c", 2.0),
            LinkData::new("b", "d", 3.0),
            LinkData::new("c", "d", 2.0),
        ],
        &SankeyConfig::default(),
    )
    .unwrap();

    for n in &layout.nodes {
        let mut outgoing: Vec<_> = layout.links.iter().filter(|l| l.source == n.id).collect();
        outgoing.sort_by(|a, b| a.y0.partial_cmp(&b.y0).unwrap());
        let mut y = n.y0;
        for l in &outgoing {
            assert!((l.y0 - l.width / 2.0 - y).abs() < EPS, "{} -> {}", l.source, l.target);
            y += l.width;
        }
        assert!(y <= n.y1 + EPS);

        let mut incoming: Vec<_> = layout.links.iter().filter(|l| l.target == n.id).collect();
        incoming.sort_by(|a, b| a.y1.partial_cmp(&b.y1).unwrap());
        let mut y = n.y0;
        for l in &incoming {
            assert!((l.y1 - l.width / 2.0 - y).abs() < EPS, "{} -> {}", l.source, l.target);
            y += l.width;
        }
    }

    // The fan follows the targets: the upper target gets the upper port.
    let (b, c) = (node(&layout, "b"), node(&layout, "c"));
    let (ab, ac) = (link(&layout, "a", "b"), link(&layout, "a", "c"));
    assert_eq!(b.y0 < c.y0, ab.y0 < ac.y0);
}

#[test]
fn ports_put_top_band_links_above_ordinary_ones() {
    let layout = eddy::layout(
        &nodes(&["a", "b", "c"]),
        &[
            LinkData::new("a", "b", 5.0),
            LinkData::new("b", "c", 5.0),
            LinkData::new("b", "a", 2.0),
        ],
        &SankeyConfig {
            layout_passes: 1,
            ..Default::default()
        },
    )
    .unwrap();
    let back = link(&layout, "b", "a");
    let forward = link(&layout, "b", "c");
    let b = node(&layout, "b");
    assert!(back.circular);
    assert_eq!(back.band, Some(Band::Top));
    assert!((back.y0 - (b.y0 + back.width / 2.0)).abs() < EPS);
    assert!((forward.y0 - (b.y0 + back.width + forward.width / 2.0)).abs() < EPS);
}

#[test]
fn ports_hug_the_lower_edge_for_bottom_band_links() {
    // Two unrelated cycles: the first back link goes over the top, the second underneath.
    let layout = eddy::layout(
        &nodes(&["a", "b", "c", "d"]),
        &[
            LinkData::new("a", "b", 10.0),
            LinkData::new("b", "a", 1.0),
            LinkData::new("c", "d", 5.0),
            LinkData::new("d", "c", 2.0),
        ],
        &SankeyConfig {
            layout_passes: 1,
            ..Default::default()
        },
    )
    .unwrap();

    let top = link(&layout, "b", "a");
    let bottom = link(&layout, "d", "c");
    assert_eq!(top.band, Some(Band::Top));
    assert_eq!(bottom.band, Some(Band::Bottom));

    let (a, b, c, d) = (
        node(&layout, "a"),
        node(&layout, "b"),
        node(&layout, "c"),
        node(&layout, "d"),
    );
    assert!((top.y0 - (b.y0 + top.width / 2.0)).abs() < EPS);
    assert!((top.y1 - (a.y0 + top.width / 2.0)).abs() < EPS);
    assert!((bottom.y0 - (d.y1 - bottom.width / 2.0)).abs() < EPS);
    assert!((bottom.y1 - (c.y1 - bottom.width / 2.0)).abs() < EPS);
}
