use eddy::{
    Band, Error, LinkData, LinkTypeStyle, NodeData, SankeyConfig, SankeyLayout, VirtualRoute,
};

fn nodes(ids: &[&str]) -> Vec<NodeData> {
    ids.iter().map(|id| NodeData::new(*id)).collect()
}

fn triangle(config: &SankeyConfig) -> SankeyLayout<String> {
    eddy::layout(
        &nodes(&["a", "b", "c"]),
        &[
            LinkData::new("a", "b", 4.0),
            LinkData::new("b", "c", 4.0),
            LinkData::new("c", "a", 2.0),
        ],
        config,
    )
    .unwrap()
}

/// a -> b -> c plus the long link a -> c, which is carried by one virtual node.
fn skip(route: VirtualRoute) -> SankeyLayout<String> {
    eddy::layout(
        &nodes(&["a", "b", "c"]),
        &[
            LinkData::new("a", "b", 2.0),
            LinkData::new("b", "c", 2.0),
            LinkData::new("a", "c", 1.0),
        ],
        &SankeyConfig {
            virtual_route: route,
            ..Default::default()
        },
    )
    .unwrap()
}

#[test]
fn layout_is_deterministic() {
    let config = SankeyConfig::default();
    let first = serde_json::to_string(&triangle(&config)).unwrap();
    let second = serde_json::to_string(&triangle(&config)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn layout_routes_the_closing_link_of_a_cycle() {
    let layout = triangle(&SankeyConfig::default());

    let columns: Vec<usize> = layout.nodes.iter().map(|n| n.column).collect();
    assert_eq!(columns, vec![0, 1, 2]);
    assert!(layout.nodes.iter().all(|n| n.part_of_cycle == (n.id != "b")));

    let circular: Vec<(&str, &str)> = layout
        .links
        .iter()
        .filter(|l| l.circular)
        .map(|l| (l.source.as_str(), l.target.as_str()))
        .collect();
    assert_eq!(circular, vec![("c", "a")]);

    let back = &layout.links[2];
    assert_eq!(back.circular_id, Some(0));
    assert!(back.band.is_some());
    assert!(back.geometry.is_some());
    assert_eq!(back.d.matches('A').count(), 4);

    for l in &layout.links {
        assert!((l.width - l.value * layout.scale).abs() < 1e-9);
    }
}

#[test]
fn layout_fits_the_canvas() {
    for (width, height) in [(600.0, 400.0), (300.0, 120.0), (1000.0, 80.0)] {
        let layout = triangle(&SankeyConfig {
            width,
            height,
            ..Default::default()
        });
        for n in &layout.nodes {
            assert!(n.y0 >= -1e-6 && n.y1 <= height + 1e-6, "{} at {width}x{height}", n.id);
            assert!(n.x0 >= -1e-6 && n.x1 <= width + 1e-6, "{} at {width}x{height}", n.id);
        }
        for l in layout.links.iter().filter(|l| l.circular) {
            let g = l.geometry.unwrap();
            assert!(g.vertical_full_extent - l.width / 2.0 >= -1e-6);
            assert!(g.vertical_full_extent + l.width / 2.0 <= height + 1e-6);
        }
    }
}

/// A chain a -> ... -> h whose later nodes all link back into a.
fn backlinked_chain(config: &SankeyConfig) -> SankeyLayout<String> {
    let ids = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let mut links: Vec<LinkData> = ids
        .windows(2)
        .map(|w| LinkData::new(w[0], w[1], 10.0))
        .collect();
    links.extend(ids[1..].iter().map(|id| LinkData::new(*id, "a", 3.0)));
    eddy::layout(&nodes(&ids), &links, config).unwrap()
}

#[test]
fn layout_keeps_circular_gaps_on_short_canvases() {
    for height in [400.0, 200.0, 120.0] {
        let config = SankeyConfig {
            height,
            ..Default::default()
        };
        let layout = backlinked_chain(&config);
        let circular: Vec<_> = layout.links.iter().filter(|l| l.circular).collect();
        assert_eq!(circular.len(), 7);

        for (i, a) in circular.iter().enumerate() {
            let ga = a.geometry.unwrap();
            assert!(ga.vertical_full_extent - a.width / 2.0 >= -1e-6, "at {height}");
            assert!(ga.vertical_full_extent + a.width / 2.0 <= height + 1e-6, "at {height}");
            for b in &circular[i + 1..] {
                if a.band != b.band || a.target != b.target {
                    continue;
                }
                let gb = b.geometry.unwrap();
                let clearance = (ga.vertical_full_extent - gb.vertical_full_extent).abs()
                    - (a.width + b.width) / 2.0;
                assert!(
                    clearance >= config.circular_link_gap - 1e-6,
                    "{}->{} and {}->{} at {height}: {clearance}",
                    a.source,
                    a.target,
                    b.source,
                    b.target
                );
            }
        }
        for n in &layout.nodes {
            assert!(n.y0 >= -1e-6 && n.y1 <= height + 1e-6, "{} at {height}", n.id);
            assert!(((n.y1 - n.y0) - n.value * layout.scale).abs() < 1e-6);
        }
    }
}

#[test]
fn layout_exposes_virtual_chains() {
    let layout = skip(VirtualRoute::Direct);

    assert_eq!(layout.nodes.len(), 3);
    assert_eq!(layout.links.len(), 3);
    assert_eq!(layout.virtual_nodes.len(), 1);
    assert_eq!(layout.virtual_nodes[0].index, 3);
    assert_eq!(layout.virtual_nodes[0].carries, 2);
    assert_eq!(layout.virtual_nodes[0].column, 1);

    assert_eq!(layout.virtual_links.len(), 2);
    assert!(layout.virtual_links.iter().all(|l| l.replaces == 2));
    assert_eq!(layout.virtual_links[0].source, 0);
    assert_eq!(layout.virtual_links[0].target, 3);
    assert_eq!(layout.virtual_links[1].target, 2);

    assert_eq!(layout.replaced_links.len(), 1);
    let replaced = &layout.replaced_links[0];
    assert_eq!(replaced.link, 2);
    assert_eq!(replaced.legs.len(), 2);
    assert_eq!(replaced.waypoints, vec![3]);

    let long = &layout.links[2];
    assert_eq!(long.y0, layout.virtual_links[0].y0);
    assert_eq!(long.y1, layout.virtual_links[1].y1);
}

#[test]
fn layout_virtual_route_shapes() {
    let curved = skip(VirtualRoute::Curved);
    assert_eq!(curved.links[2].path.commands().len(), 3);

    let chained = skip(VirtualRoute::Chained);
    assert_eq!(chained.links[2].path.commands().len(), 4);
    assert!(chained.links[2].d.contains('L'));

    let direct = skip(VirtualRoute::Direct);
    let n = direct.links[2].path.commands().len();
    assert!(n == 2 || n == 3, "{}", direct.links[2].d);
}

#[test]
fn layout_legend_lists_configured_types_first() {
    let mut links = vec![
        LinkData::new("a", "b", 1.0),
        LinkData::new("a", "c", 2.0),
        LinkData::new("b", "c", 3.0),
        LinkData::new("c", "d", 4.0),
        LinkData::new("b", "d", 5.0),
    ];
    for (l, kind) in links.iter_mut().zip(["coal", "oil", "gas", "water", "coal"]) {
        l.kind = Some(kind.to_string());
    }
    let config = SankeyConfig {
        link_types: vec![
            LinkTypeStyle {
                name: "gas".to_string(),
                color: "#00f".to_string(),
                label: Some("Natural gas".to_string()),
            },
            LinkTypeStyle {
                name: "coal".to_string(),
                color: "#333".to_string(),
                label: None,
            },
            LinkTypeStyle {
                name: "solar".to_string(),
                color: "#ff0".to_string(),
                label: None,
            },
        ],
        ..Default::default()
    };
    let layout = eddy::layout(&nodes(&["a", "b", "c", "d"]), &links, &config).unwrap();

    let names: Vec<&str> = layout.legend.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["gas", "coal", "oil", "water"]);
    assert_eq!(layout.legend[0].label, "Natural gas");
    assert_eq!(layout.legend[1].label, "coal");
    assert_eq!(layout.legend[1].value, 6.0);
    assert_eq!(layout.legend[2].color, eddy::output::DEFAULT_PALETTE[0]);
    assert_eq!(layout.legend[3].color, eddy::output::DEFAULT_PALETTE[1]);

    assert_eq!(layout.links[0].color.as_deref(), Some("#333"));
    assert_eq!(layout.links[1].color.as_deref(), Some(eddy::output::DEFAULT_PALETTE[0]));
}

#[test]
fn layout_untyped_links_have_no_legend() {
    let layout = triangle(&SankeyConfig::default());
    assert!(layout.legend.is_empty());
    assert!(layout.links.iter().all(|l| l.color.is_none()));
}

#[test]
fn layout_rejects_invalid_config() {
    let err = eddy::layout(
        &nodes(&["a", "b"]),
        &[LinkData::new("a", "b", 1.0)],
        &SankeyConfig {
            node_padding: -1.0,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));

    let err = eddy::layout(
        &nodes(&["a", "b"]),
        &[LinkData::new("a", "b", 1.0)],
        &SankeyConfig {
            width: 20.0,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("nodeWidth"), "{err}");
}

#[test]
fn layout_serializes_camel_case_json() {
    let layout = triangle(&SankeyConfig::default());
    let json = serde_json::to_value(&layout).unwrap();
    assert!(json["nodeWidth"].is_number());
    assert!(json["links"][2]["circularId"].is_number());
    assert!(json["links"][2]["geometry"]["verticalFullExtent"].is_number());
    assert_eq!(json["links"][0]["geometry"], serde_json::Value::Null);
    assert_eq!(json["links"][0]["path"][0]["op"], "moveTo");
    let band = json["links"][2]["band"].as_str().unwrap();
    assert!(band == "top" || band == "bottom");
    assert_eq!(
        layout.links[2].band == Some(Band::Top),
        band == "top"
    );
}

#[test]
fn layout_input_from_csv() {
    let text = "sankey-beta\n%% energy\nCoal,Power,30\nGas,Power,20\nPower,Homes,45\nPower,Losses,5\n";
    let input = eddy::parse_csv(text).unwrap();
    let layout = eddy::layout_input(input, &SankeyConfig::default()).unwrap();
    let ids: Vec<&str> = layout.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["Coal", "Power", "Gas", "Homes", "Losses"]);
    let power = layout.nodes.iter().find(|n| n.id == "Power").unwrap();
    assert_eq!(power.value, 50.0);
    assert!(layout.links.iter().all(|l| !l.circular));
}
