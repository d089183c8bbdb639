//! Breadth Placer: vertical node extents per column.
//!
//! Nodes get their value-proportional heights, an initial stacking that keeps cycle nodes next to
//! the band their circular links use, a damped relaxation toward their neighbours, and a final
//! collision pass that also clears room for self-loops.

use crate::config::{BreadthOrdering, SankeyConfig};
use crate::model::{Band, SankeyGraph};
use crate::util::{f64_cmp, mean};
use std::cmp::Ordering;

pub fn run(g: &mut SankeyGraph, config: &SankeyConfig) {
    let ky = g.scale;
    for n in &mut g.nodes {
        n.y0 = 0.0;
        n.y1 = n.value * ky;
    }

    let mut columns = g.columns();
    for column in &mut columns {
        sort_column(g, column, config.breadth_ordering);
    }
    let last = columns.len().saturating_sub(1);
    for (ci, column) in columns.iter().enumerate() {
        initialize_column(g, column, ci == 0 || ci == last);
    }

    let mut alpha = 1.0;
    for _ in 0..config.iterations {
        alpha *= 0.99;
        for ci in 0..columns.len() {
            relax_column(g, &columns[ci], alpha, ci == 0 || ci == last);
            resolve_collisions(g, &mut columns[ci], config);
        }
        for ci in (0..columns.len()).rev() {
            relax_column(g, &columns[ci], alpha, ci == 0 || ci == last);
            resolve_collisions(g, &mut columns[ci], config);
        }
    }
    if config.iterations == 0 {
        for column in &mut columns {
            resolve_collisions(g, column, config);
        }
    }

    tracing::debug!(iterations = config.iterations, "placed node breadths");
}

fn band_rank(band: Option<Band>) -> u8 {
    match band {
        Some(Band::Top) => 0,
        None => 1,
        Some(Band::Bottom) => 2,
    }
}

/// Committed band of a node for placement purposes; nodes off every cycle stay uncommitted.
fn committed_band(g: &SankeyGraph, ni: usize) -> Option<Band> {
    let n = &g.nodes[ni];
    if n.part_of_cycle { n.band } else { None }
}

fn sort_column(g: &SankeyGraph, column: &mut [usize], ordering: BreadthOrdering) {
    match ordering {
        BreadthOrdering::Key => column.sort_by(|&a, &b| {
            match (g.nodes[a].breadth_key, g.nodes[b].breadth_key) {
                (Some(ka), Some(kb)) => f64_cmp(ka, kb),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.cmp(&b))
        }),
        BreadthOrdering::Heuristic => column.sort_by(|&a, &b| {
            let (ba, bb) = (committed_band(g, a), committed_band(g, b));
            if ba == bb {
                g.non_self_circular_count(a)
                    .cmp(&g.non_self_circular_count(b))
                    .then_with(|| a.cmp(&b))
            } else {
                band_rank(ba).cmp(&band_rank(bb))
            }
        }),
    }
}

fn set_y0(g: &mut SankeyGraph, ni: usize, y0: f64) {
    let n = &mut g.nodes[ni];
    let h = n.y1 - n.y0;
    n.y0 = y0;
    n.y1 = y0 + h;
}

fn shift(g: &mut SankeyGraph, ni: usize, dy: f64) {
    let n = &mut g.nodes[ni];
    n.y0 += dy;
    n.y1 += dy;
}

/// Top-band cycle nodes stack down from the top, bottom-band ones up from the bottom, and the rest
/// are spread over what is left in between.
fn initialize_column(g: &mut SankeyGraph, column: &[usize], end_column: bool) {
    let inner = g.inner;
    let py = g.padding;

    if end_column && column.len() == 1 {
        let ni = column[0];
        let h = g.nodes[ni].breadth();
        set_y0(g, ni, inner.y0 + (inner.height() - h) / 2.0);
        return;
    }

    let is_pinned = |g: &SankeyGraph, ni: usize, band: Band| {
        committed_band(g, ni) == Some(band) && g.non_self_circular_count(ni) > 0
    };
    let top: Vec<usize> = column
        .iter()
        .copied()
        .filter(|&ni| is_pinned(g, ni, Band::Top))
        .collect();
    let bottom: Vec<usize> = column
        .iter()
        .copied()
        .filter(|&ni| is_pinned(g, ni, Band::Bottom))
        .collect();
    let free: Vec<usize> = column
        .iter()
        .copied()
        .filter(|ni| !top.contains(ni) && !bottom.contains(ni))
        .collect();

    let mut y = inner.y0;
    for &ni in &top {
        set_y0(g, ni, y);
        y = g.nodes[ni].y1 + py;
    }
    let upper = if top.is_empty() { inner.y0 } else { y };

    let mut y = inner.y1;
    for &ni in bottom.iter().rev() {
        let h = g.nodes[ni].breadth();
        set_y0(g, ni, y - h);
        y = g.nodes[ni].y0 - py;
    }
    let lower = if bottom.is_empty() { inner.y1 } else { y };

    if free.is_empty() {
        return;
    }
    let total: f64 = free.iter().map(|&ni| g.nodes[ni].breadth()).sum();
    let slots = free.len() as f64 + 1.0;
    let gap = ((lower - upper - total) / slots).clamp(py, 2.0 * py);
    let block = total + gap * (free.len() as f64 - 1.0);
    let mut y = upper + ((lower - upper) - block) / 2.0;
    for &ni in &free {
        set_y0(g, ni, y);
        y = g.nodes[ni].y1 + gap;
    }
}

/// Nodes held by their band (or centred alone in an end column) do not follow their neighbours.
fn is_anchored(g: &SankeyGraph, ni: usize, column_len: usize, end_column: bool) -> bool {
    (g.nodes[ni].part_of_cycle && g.non_self_circular_count(ni) > 0)
        || (end_column && column_len == 1)
}

fn relax_column(g: &mut SankeyGraph, column: &[usize], alpha: f64, end_column: bool) {
    for &ni in column {
        if is_anchored(g, ni, column.len(), end_column) {
            continue;
        }
        let n = &g.nodes[ni];
        let forward = |li: &&usize| !g.links[**li].circular;
        let downstream = mean(
            n.source_links
                .iter()
                .filter(forward)
                .map(|&li| g.nodes[g.links[li].target].center()),
        );
        let upstream = mean(
            n.target_links
                .iter()
                .filter(forward)
                .map(|&li| g.nodes[g.links[li].source].center()),
        );
        let target = match (downstream, upstream) {
            (Some(d), Some(u)) => (d + u) / 2.0,
            (Some(v), None) | (None, Some(v)) => v,
            (None, None) => continue,
        };
        let dy = (target - n.center()) * alpha;
        shift(g, ni, dy);
    }
}

/// Extra room a node needs above and below for its own self-loops.
fn self_loop_clearance(g: &SankeyGraph, ni: usize, config: &SankeyConfig) -> (f64, f64) {
    let mut above = 0.0_f64;
    let mut below = 0.0_f64;
    for &li in &g.nodes[ni].source_links {
        let l = &g.links[li];
        if !l.circular || !l.is_self() {
            continue;
        }
        let need = config.self_loop_margin + l.width;
        match l.band {
            Some(Band::Top) => above = above.max(need),
            _ => below = below.max(need),
        }
    }
    (above, below)
}

fn resolve_collisions(g: &mut SankeyGraph, column: &mut [usize], config: &SankeyConfig) {
    if column.is_empty() {
        return;
    }
    column.sort_by(|&a, &b| f64_cmp(g.nodes[a].y0, g.nodes[b].y0).then_with(|| a.cmp(&b)));
    let clearance: Vec<(f64, f64)> = column
        .iter()
        .map(|&ni| self_loop_clearance(g, ni, config))
        .collect();
    let inner = g.inner;
    let py = g.padding;

    let mut y = inner.y0;
    for (i, &ni) in column.iter().enumerate() {
        let (above, below) = clearance[i];
        let top = g.nodes[ni].y0 - if i == 0 { 0.0 } else { above };
        if top < y {
            shift(g, ni, y - top);
        }
        y = g.nodes[ni].y1 + below + py;
    }

    let last = column.len() - 1;
    let overflow = g.nodes[column[last]].y1 - inner.y1;
    if overflow > 0.0 {
        let mut y = inner.y1;
        for (i, &ni) in column.iter().enumerate().rev() {
            let (above, below) = clearance[i];
            let bottom = g.nodes[ni].y1 + if i == last { 0.0 } else { below };
            if bottom > y {
                shift(g, ni, y - bottom);
            }
            y = g.nodes[ni].y0 - above - py;
        }
        let underflow = inner.y0 - g.nodes[column[0]].y0;
        let slack = inner.y1 - g.nodes[column[last]].y1;
        let down = underflow.min(slack);
        if down > 0.0 {
            for &ni in column.iter() {
                shift(g, ni, down);
            }
        }
    }
}
