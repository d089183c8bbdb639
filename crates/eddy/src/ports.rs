//! Port Orderer: where each link attaches to its nodes.
//!
//! Outgoing and incoming lists are sorted independently, then every link gets a width-sized slice
//! of the node edge. Top-band circular links take the upper slices, bottom-band ones are pinned to
//! the lower edge, and ordinary links in between follow their slope.

use crate::config::SankeyConfig;
use crate::model::{Band, Link, SankeyGraph};
use crate::util::f64_cmp;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Outgoing,
    Incoming,
}

pub fn run(g: &mut SankeyGraph, config: &SankeyConfig) {
    for li in 0..g.links.len() {
        let (s, t) = (g.links[li].source, g.links[li].target);
        let (sy, ty) = (g.nodes[s].center(), g.nodes[t].center());
        let link = &mut g.links[li];
        link.y0 = sy;
        link.y1 = ty;
    }

    let rounds = config.port_iterations.max(1);
    for _ in 0..rounds {
        for ni in 0..g.nodes.len() {
            order_ports(g, ni, Side::Outgoing);
        }
        for ni in 0..g.nodes.len() {
            order_ports(g, ni, Side::Incoming);
        }
    }
    tracing::debug!(rounds, "ordered link ports");
}

/// Ordinary links sit between the two bands.
fn slot(l: &Link) -> u8 {
    match (l.circular, l.band) {
        (false, _) => 1,
        (true, Some(Band::Top)) => 0,
        (true, _) => 2,
    }
}

fn compare(g: &SankeyGraph, ni: usize, side: Side, a: usize, b: usize) -> Ordering {
    let (la, lb) = (&g.links[a], &g.links[b]);
    let by_slot = slot(la).cmp(&slot(lb));
    if by_slot != Ordering::Equal {
        return by_slot;
    }
    let other = |l: &Link| match side {
        Side::Outgoing => l.target,
        Side::Incoming => l.source,
    };
    let ord = if la.circular {
        compare_circular(g, side, a, b)
    } else {
        let node = &g.nodes[ni];
        let (oa, ob) = (&g.nodes[other(la)], &g.nodes[other(lb)]);
        if oa.column == node.column || ob.column == node.column {
            f64_cmp(oa.center(), ob.center())
        } else {
            f64_cmp(slope(g, ni, side, la), slope(g, ni, side, lb))
        }
    };
    ord.then_with(|| a.cmp(&b))
}

/// Vertical drop per unit of horizontal run toward the link's other end.
fn slope(g: &SankeyGraph, ni: usize, side: Side, l: &Link) -> f64 {
    let node = &g.nodes[ni];
    let (far_y, far) = match side {
        Side::Outgoing => (l.y1, &g.nodes[l.target]),
        Side::Incoming => (l.y0, &g.nodes[l.source]),
    };
    let run = (far.center_x() - node.center_x()).abs();
    if run > 0.0 {
        (far_y - node.center()) / run
    } else {
        far_y - node.center()
    }
}

fn compare_circular(g: &SankeyGraph, side: Side, a: usize, b: usize) -> Ordering {
    let (la, lb) = (&g.links[a], &g.links[b]);
    let span = match la.band {
        Some(Band::Top) => g.column_span(a).cmp(&g.column_span(b)),
        _ => g.column_span(b).cmp(&g.column_span(a)),
    };
    let far_center = |l: &Link| match side {
        Side::Outgoing => g.nodes[l.target].center(),
        Side::Incoming => g.nodes[l.source].center(),
    };
    la.is_self()
        .cmp(&lb.is_self())
        .then(span)
        .then_with(|| f64_cmp(la.width, lb.width))
        .then_with(|| f64_cmp(far_center(la), far_center(lb)))
}

fn order_ports(g: &mut SankeyGraph, ni: usize, side: Side) {
    let mut list = match side {
        Side::Outgoing => g.nodes[ni].source_links.clone(),
        Side::Incoming => g.nodes[ni].target_links.clone(),
    };
    if list.is_empty() {
        return;
    }
    list.sort_by(|&a, &b| compare(g, ni, side, a, b));

    let (top, bottom) = (g.nodes[ni].y0, g.nodes[ni].y1);
    let set = |l: &mut Link, y: f64| match side {
        Side::Outgoing => l.y0 = y,
        Side::Incoming => l.y1 = y,
    };
    let mut y = top;
    for &li in &list {
        let w = g.links[li].width;
        set(&mut g.links[li], y + w / 2.0);
        y += w;
    }

    let mut y = bottom;
    for &li in list.iter().rev() {
        if slot(&g.links[li]) != 2 {
            break;
        }
        let w = g.links[li].width;
        set(&mut g.links[li], y - w / 2.0);
        y -= w;
    }

    match side {
        Side::Outgoing => g.nodes[ni].source_links = list,
        Side::Incoming => g.nodes[ni].target_links = list,
    }
}
