//! Virtual Node Inserter: split long-span links into chains of one-column legs.
//!
//! `run` materializes one virtual node per intermediate column so breadth placement and port
//! ordering only ever see links between adjacent columns. `undo` puts the original link back into
//! its endpoints' adjacency lists once geometry is final; the chain stays in the tables so the
//! output can expose it and the path builder can stitch the original link's path.

use crate::config::SankeyConfig;
use crate::model::{Link, LinkKind, Node, SankeyGraph};

pub fn run(g: &mut SankeyGraph, config: &SankeyConfig) {
    if !config.virtual_nodes {
        return;
    }
    let long: Vec<usize> = g
        .links
        .iter()
        .filter(|l| l.kind == LinkKind::Real && !l.circular)
        .filter(|l| g.nodes[l.target].column > g.nodes[l.source].column + 1)
        .map(|l| l.index)
        .collect();

    for &li in &long {
        split_link(g, li);
    }
    tracing::debug!(
        replaced = long.len(),
        virtual_nodes = g.nodes.iter().filter(|n| n.is_virtual()).count(),
        "inserted virtual chains"
    );
}

fn split_link(g: &mut SankeyGraph, li: usize) {
    let (s, t, value) = (g.links[li].source, g.links[li].target, g.links[li].value);
    let link_type = g.links[li].link_type.clone();
    let (source_column, source_depth) = (g.nodes[s].column, g.nodes[s].depth);
    let (target_column, target_height) = (g.nodes[t].column, g.nodes[t].height);

    let mut legs: Vec<usize> = Vec::with_capacity(target_column - source_column);
    let mut waypoints: Vec<usize> = Vec::with_capacity(target_column - source_column - 1);
    let mut prev = s;

    for column in (source_column + 1)..=target_column {
        let to = if column == target_column {
            t
        } else {
            g.push_node(Node {
                virtual_of: Some(li),
                value,
                column,
                depth: source_depth + (column - source_column),
                height: target_height + (target_column - column),
                ..Default::default()
            })
        };
        let leg = g.push_link(Link {
            source: prev,
            target: to,
            value,
            kind: LinkKind::Virtual { replaced: li },
            link_type: link_type.clone(),
            ..Default::default()
        });

        if prev == s {
            swap_in_list(&mut g.nodes[s].source_links, li, leg);
        } else {
            g.nodes[prev].source_links.push(leg);
        }
        if to == t {
            swap_in_list(&mut g.nodes[t].target_links, li, leg);
        } else {
            g.nodes[to].target_links.push(leg);
            waypoints.push(to);
        }
        legs.push(leg);
        prev = to;
    }

    g.links[li].kind = LinkKind::Replaced { legs, waypoints };
}

fn swap_in_list(list: &mut [usize], from: usize, to: usize) {
    if let Some(slot) = list.iter_mut().find(|slot| **slot == from) {
        *slot = to;
    }
}

/// Restore replaced links into their endpoints' adjacency and give them the chain's ports.
pub fn undo(g: &mut SankeyGraph) {
    for li in 0..g.links.len() {
        let LinkKind::Replaced { legs, .. } = &g.links[li].kind else {
            continue;
        };
        let (Some(&first), Some(&last)) = (legs.first(), legs.last()) else {
            continue;
        };
        let (s, t) = (g.links[li].source, g.links[li].target);
        let (y0, y1) = (g.links[first].y0, g.links[last].y1);
        swap_in_list(&mut g.nodes[s].source_links, first, li);
        swap_in_list(&mut g.nodes[t].target_links, last, li);

        let link = &mut g.links[li];
        link.y0 = y0;
        link.y1 = y1;
        link.width = link.value * g.scale;
    }
}
