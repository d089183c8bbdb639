//! Circular Path Builder and link path primitives.
//!
//! Circular links are routed through their band as line/arc sequences whose vertical runs are
//! stacked by [`vertical buffers`](CircularGeometry::vertical_buffer) so that crossing bundles nest
//! instead of overlapping. Ordinary links get the usual horizontal-tangent cubic, or a bypass when a
//! multi-column link would cut through an intermediate node.

use crate::config::{SankeyConfig, VirtualRoute};
use crate::model::{Band, LinkKind, SankeyGraph};
use crate::util::{f64_cmp, fmt_coord};
use serde::Serialize;
use std::collections::BTreeMap;

/// Sample count used when testing a cubic against node rectangles.
const CURVE_SAMPLES: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PathCommand {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    /// Elliptical arc; the rotation and large-arc flags are always zero.
    ArcTo {
        rx: f64,
        ry: f64,
        sweep: bool,
        x: f64,
        y: f64,
    },
    CubicTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LinkPath(pub Vec<PathCommand>);

impl LinkPath {
    pub fn commands(&self) -> &[PathCommand] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn start(&self) -> Option<(f64, f64)> {
        match self.0.first()? {
            PathCommand::MoveTo { x, y } | PathCommand::LineTo { x, y } => Some((*x, *y)),
            PathCommand::ArcTo { x, y, .. } | PathCommand::CubicTo { x, y, .. } => Some((*x, *y)),
        }
    }

    pub fn end(&self) -> Option<(f64, f64)> {
        match self.0.last()? {
            PathCommand::MoveTo { x, y } | PathCommand::LineTo { x, y } => Some((*x, *y)),
            PathCommand::ArcTo { x, y, .. } | PathCommand::CubicTo { x, y, .. } => Some((*x, *y)),
        }
    }

    /// SVG path data, e.g. `M0 10L5 10A12 12 0 0 0 17 -2`.
    pub fn to_svg_d(&self) -> String {
        let mut buf = ryu_js::Buffer::new();
        let mut out = String::with_capacity(self.0.len() * 24);
        for cmd in &self.0 {
            match *cmd {
                PathCommand::MoveTo { x, y } => {
                    out.push('M');
                    push_pair(&mut out, &mut buf, x, y);
                }
                PathCommand::LineTo { x, y } => {
                    out.push('L');
                    push_pair(&mut out, &mut buf, x, y);
                }
                PathCommand::ArcTo {
                    rx,
                    ry,
                    sweep,
                    x,
                    y,
                } => {
                    out.push('A');
                    push_pair(&mut out, &mut buf, rx, ry);
                    out.push_str(if sweep { " 0 0 1 " } else { " 0 0 0 " });
                    push_pair(&mut out, &mut buf, x, y);
                }
                PathCommand::CubicTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    out.push('C');
                    push_pair(&mut out, &mut buf, x1, y1);
                    out.push(' ');
                    push_pair(&mut out, &mut buf, x2, y2);
                    out.push(' ');
                    push_pair(&mut out, &mut buf, x, y);
                }
            }
        }
        out
    }

    /// Smallest and largest y among the path's points and cubic control points.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        let mut ys = self.0.iter().flat_map(|cmd| match *cmd {
            PathCommand::MoveTo { y, .. }
            | PathCommand::LineTo { y, .. }
            | PathCommand::ArcTo { y, .. } => [y, y, y],
            PathCommand::CubicTo { y1, y2, y, .. } => [y1, y2, y],
        });
        let first = ys.next()?;
        Some(ys.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y))))
    }
}

fn push_pair(out: &mut String, buf: &mut ryu_js::Buffer, x: f64, y: f64) {
    out.push_str(&fmt_coord(x, buf));
    out.push(' ');
    out.push_str(&fmt_coord(y, buf));
}

/// Construction data of a circular link's route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircularGeometry {
    pub vertical_buffer: f64,
    pub source_x: f64,
    pub source_y: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub left_small_arc_radius: f64,
    pub left_large_arc_radius: f64,
    pub right_small_arc_radius: f64,
    pub right_large_arc_radius: f64,
    pub left_inner_extent: f64,
    pub left_full_extent: f64,
    pub right_inner_extent: f64,
    pub right_full_extent: f64,
    /// y of the horizontal run through the band.
    pub vertical_full_extent: f64,
    pub vertical_left_inner_extent: f64,
    pub vertical_right_inner_extent: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Radii {
    left_small: f64,
    left_large: f64,
    right_small: f64,
    right_large: f64,
}

pub fn run(g: &mut SankeyGraph, config: &SankeyConfig) {
    build_circular(g, config);
    let bypassed = build_ordinary(g, config);
    tracing::debug!(
        circular = g.circular_links().count(),
        bypassed,
        "built link paths"
    );
}

fn band_of(g: &SankeyGraph, li: usize) -> Band {
    g.links[li].band.unwrap_or(Band::Bottom)
}

fn build_circular(g: &mut SankeyGraph, config: &SankeyConfig) {
    let (min_y, max_y) = node_span(g);
    let mut buffers = vec![0.0; g.links.len()];
    for band in [Band::Top, Band::Bottom] {
        let members: Vec<usize> = g
            .circular_links()
            .filter(|l| l.band.unwrap_or(Band::Bottom) == band)
            .map(|l| l.index)
            .collect();
        vertical_buffers(g, members, band, config.circular_link_gap, &mut buffers);
    }
    let radii = fan_radii(g, config);

    let circular: Vec<usize> = g.circular_links().map(|l| l.index).collect();
    for li in circular {
        let band = band_of(g, li);
        let l = &g.links[li];
        let (s, t) = (&g.nodes[l.source], &g.nodes[l.target]);
        let half = l.width / 2.0;
        let away = match band {
            Band::Top => -1.0,
            Band::Bottom => 1.0,
        };
        let (sx, sy, tx, ty) = (s.x1, l.y0, t.x0, l.y1);

        let (vertical, r) = if l.is_self() {
            let edge = match band {
                Band::Top => s.y0,
                Band::Bottom => s.y1,
            };
            let vertical = edge + away * (config.self_loop_margin + half);
            let base = config.base_arc_radius + half;
            let left = base.min((sy - vertical).abs() / 2.0);
            let right = base.min((ty - vertical).abs() / 2.0);
            let r = Radii {
                left_small: left,
                left_large: left,
                right_small: right,
                right_large: right,
            };
            (vertical, r)
        } else {
            let base = match band {
                Band::Top => min_y,
                Band::Bottom => max_y,
            };
            (
                base + away * (config.circular_margin + buffers[li]),
                radii[li],
            )
        };

        let geom = CircularGeometry {
            vertical_buffer: buffers[li],
            source_x: sx,
            source_y: sy,
            target_x: tx,
            target_y: ty,
            left_small_arc_radius: r.left_small,
            left_large_arc_radius: r.left_large,
            right_small_arc_radius: r.right_small,
            right_large_arc_radius: r.right_large,
            left_inner_extent: sx + config.node_buffer,
            left_full_extent: sx + r.left_large + config.node_buffer,
            right_inner_extent: tx - config.node_buffer,
            right_full_extent: tx - r.right_large - config.node_buffer,
            vertical_full_extent: vertical,
            vertical_left_inner_extent: vertical - away * r.left_large,
            vertical_right_inner_extent: vertical - away * r.right_large,
        };
        let path = circular_path(&geom, band);
        let link = &mut g.links[li];
        link.geometry = Some(geom);
        link.path = path;
    }
}

fn node_span(g: &SankeyGraph) -> (f64, f64) {
    let lo = g.nodes.iter().map(|n| n.y0).fold(f64::INFINITY, f64::min);
    let hi = g.nodes.iter().map(|n| n.y1).fold(f64::NEG_INFINITY, f64::max);
    if lo.is_finite() && hi.is_finite() {
        (lo, hi)
    } else {
        (g.inner.y0, g.inner.y1)
    }
}

fn columns_overlap(g: &SankeyGraph, a: usize, b: usize) -> bool {
    let range = |li: usize| {
        let l = &g.links[li];
        let (sc, tc) = (g.nodes[l.source].column, g.nodes[l.target].column);
        (sc.min(tc), sc.max(tc))
    };
    let (a0, a1) = range(a);
    let (b0, b1) = range(b);
    a0.max(b0) <= a1.min(b1)
}

/// Orders a band by column span and stacks each link just outside every earlier link it can cross.
fn vertical_buffers(
    g: &SankeyGraph,
    mut members: Vec<usize>,
    band: Band,
    gap: f64,
    buffers: &mut [f64],
) {
    members.sort_by(|&a, &b| {
        let (ya, yb) = (g.links[a].y0, g.links[b].y0);
        let by_y = match band {
            Band::Top => f64_cmp(ya, yb),
            Band::Bottom => f64_cmp(yb, ya),
        };
        g.column_span(a)
            .cmp(&g.column_span(b))
            .then(by_y)
            .then_with(|| a.cmp(&b))
    });
    for (i, &li) in members.iter().enumerate() {
        let link = &g.links[li];
        let mut floor = 0.0_f64;
        if !link.is_self() {
            for &lj in &members[..i] {
                let other = &g.links[lj];
                if other.is_self() || !columns_overlap(g, li, lj) {
                    continue;
                }
                floor = floor.max(buffers[lj] + other.width / 2.0 + gap);
            }
        }
        buffers[li] = floor + link.width / 2.0;
    }
}

/// Arc radii fanned out across links leaving (or entering) one column on one band.
fn fan_radii(g: &SankeyGraph, config: &SankeyConfig) -> Vec<Radii> {
    let mut by_source: BTreeMap<(usize, Band), Vec<usize>> = BTreeMap::new();
    let mut by_target: BTreeMap<(usize, Band), Vec<usize>> = BTreeMap::new();
    for l in g.circular_links() {
        if l.is_self() {
            continue;
        }
        let band = l.band.unwrap_or(Band::Bottom);
        by_source
            .entry((g.nodes[l.source].column, band))
            .or_default()
            .push(l.index);
        by_target
            .entry((g.nodes[l.target].column, band))
            .or_default()
            .push(l.index);
    }

    let mut radii = vec![Radii::default(); g.links.len()];
    for ((_, band), mut group) in by_source {
        sort_by_port(&mut group, band, |li| g.links[li].y0);
        for (li, small, large) in fan(g, config, &group) {
            radii[li].left_small = small;
            radii[li].left_large = large;
        }
    }
    for ((_, band), mut group) in by_target {
        sort_by_port(&mut group, band, |li| g.links[li].y1);
        for (li, small, large) in fan(g, config, &group) {
            radii[li].right_small = small;
            radii[li].right_large = large;
        }
    }
    radii
}

/// Links nearest the band come first.
fn sort_by_port(group: &mut [usize], band: Band, port: impl Fn(usize) -> f64) {
    group.sort_by(|&a, &b| {
        let ord = match band {
            Band::Top => f64_cmp(port(a), port(b)),
            Band::Bottom => f64_cmp(port(b), port(a)),
        };
        ord.then_with(|| a.cmp(&b))
    });
}

fn fan(g: &SankeyGraph, config: &SankeyConfig, group: &[usize]) -> Vec<(usize, f64, f64)> {
    let mut offset = 0.0;
    let mut out = Vec::with_capacity(group.len());
    for (i, &li) in group.iter().enumerate() {
        let width = g.links[li].width;
        let small = config.base_arc_radius + width / 2.0 + offset;
        let large = small + i as f64 * config.circular_link_gap;
        out.push((li, small, large));
        offset += width;
    }
    out
}

fn circular_path(c: &CircularGeometry, band: Band) -> LinkPath {
    let (away, sweep) = match band {
        Band::Top => (-1.0, false),
        Band::Bottom => (1.0, true),
    };
    LinkPath(vec![
        PathCommand::MoveTo {
            x: c.source_x,
            y: c.source_y,
        },
        PathCommand::LineTo {
            x: c.left_inner_extent,
            y: c.source_y,
        },
        PathCommand::ArcTo {
            rx: c.left_large_arc_radius,
            ry: c.left_small_arc_radius,
            sweep,
            x: c.left_full_extent,
            y: c.source_y + away * c.left_small_arc_radius,
        },
        PathCommand::LineTo {
            x: c.left_full_extent,
            y: c.vertical_left_inner_extent,
        },
        PathCommand::ArcTo {
            rx: c.left_large_arc_radius,
            ry: c.left_large_arc_radius,
            sweep,
            x: c.left_inner_extent,
            y: c.vertical_full_extent,
        },
        PathCommand::LineTo {
            x: c.right_inner_extent,
            y: c.vertical_full_extent,
        },
        PathCommand::ArcTo {
            rx: c.right_large_arc_radius,
            ry: c.right_large_arc_radius,
            sweep,
            x: c.right_full_extent,
            y: c.vertical_right_inner_extent,
        },
        PathCommand::LineTo {
            x: c.right_full_extent,
            y: c.target_y + away * c.right_small_arc_radius,
        },
        PathCommand::ArcTo {
            rx: c.right_large_arc_radius,
            ry: c.right_small_arc_radius,
            sweep,
            x: c.right_inner_extent,
            y: c.target_y,
        },
        PathCommand::LineTo {
            x: c.target_x,
            y: c.target_y,
        },
    ])
}

/// The standard sankey link shape: a cubic leaving and entering horizontally.
pub fn horizontal_link(x0: f64, y0: f64, x1: f64, y1: f64) -> LinkPath {
    let xm = (x0 + x1) / 2.0;
    LinkPath(vec![
        PathCommand::MoveTo { x: x0, y: y0 },
        PathCommand::CubicTo {
            x1: xm,
            y1: y0,
            x2: xm,
            y2: y1,
            x: x1,
            y: y1,
        },
    ])
}

fn build_ordinary(g: &mut SankeyGraph, config: &SankeyConfig) -> usize {
    let mut bypassed = 0usize;
    for li in 0..g.links.len() {
        let l = &g.links[li];
        if l.circular || l.is_replaced() {
            continue;
        }
        let (s, t) = (&g.nodes[l.source], &g.nodes[l.target]);
        let (x0, y0, x1, y1) = (s.x1, l.y0, t.x0, l.y1);
        let mut path = horizontal_link(x0, y0, x1, y1);
        if g.column_span(li) > 1 {
            let between = intermediate_nodes(g, s.column, t.column);
            if crosses_nodes(g, (x0, y0), (x1, y1), l.width, &between) {
                path = bypass(g, li, &between, config.circular_link_gap);
                bypassed += 1;
                tracing::trace!(link = li, "bypassing obstructed link");
            }
        }
        let link = &mut g.links[li];
        link.path = path;
        link.geometry = None;
    }
    bypassed
}

/// Real nodes in the columns strictly between `a` and `b`.
fn intermediate_nodes(g: &SankeyGraph, a: usize, b: usize) -> Vec<usize> {
    let (lo, hi) = (a.min(b), a.max(b));
    g.nodes
        .iter()
        .filter(|n| !n.is_virtual() && n.column > lo && n.column < hi)
        .map(|n| n.index)
        .collect()
}

fn cubic_point(p0: (f64, f64), p3: (f64, f64), t: f64) -> (f64, f64) {
    let xm = (p0.0 + p3.0) / 2.0;
    let u = 1.0 - t;
    let x = u * u * u * p0.0 + 3.0 * u * u * t * xm + 3.0 * u * t * t * xm + t * t * t * p3.0;
    let y = u * u * u * p0.1 + 3.0 * u * u * t * p0.1 + 3.0 * u * t * t * p3.1 + t * t * t * p3.1;
    (x, y)
}

/// Whether the stroke of a horizontal-tangent cubic passes through any of `nodes`.
fn crosses_nodes(
    g: &SankeyGraph,
    from: (f64, f64),
    to: (f64, f64),
    width: f64,
    nodes: &[usize],
) -> bool {
    if nodes.is_empty() {
        return false;
    }
    let half = width / 2.0;
    (1..CURVE_SAMPLES).any(|i| {
        let (x, y) = cubic_point(from, to, i as f64 / CURVE_SAMPLES as f64);
        nodes.iter().any(|&ni| {
            let n = &g.nodes[ni];
            x >= n.x0 && x <= n.x1 && y + half > n.y0 && y - half < n.y1
        })
    })
}

/// Curve into a horizontal run clear of every node in `between`, on the side nearer the ports.
fn bypass(g: &SankeyGraph, li: usize, between: &[usize], gap: f64) -> LinkPath {
    let l = &g.links[li];
    let (s, t) = (&g.nodes[l.source], &g.nodes[l.target]);
    let half = l.width / 2.0;
    let top = between
        .iter()
        .map(|&ni| g.nodes[ni].y0)
        .fold(f64::INFINITY, f64::min);
    let bottom = between
        .iter()
        .map(|&ni| g.nodes[ni].y1)
        .fold(f64::NEG_INFINITY, f64::max);
    let run_x0 = between
        .iter()
        .map(|&ni| g.nodes[ni].x0)
        .fold(f64::INFINITY, f64::min);
    let run_x1 = between
        .iter()
        .map(|&ni| g.nodes[ni].x1)
        .fold(f64::NEG_INFINITY, f64::max);

    let above = top - half - gap;
    let below = bottom + half + gap;
    let mid = (l.y0 + l.y1) / 2.0;
    let level = if (mid - above).abs() <= (below - mid).abs() {
        above
    } else {
        below
    };

    let mut cmds = horizontal_link(s.x1, l.y0, run_x0, level).0;
    cmds.push(PathCommand::LineTo {
        x: run_x1,
        y: level,
    });
    cmds.extend(horizontal_link(run_x1, level, t.x0, l.y1).0.into_iter().skip(1));
    LinkPath(cmds)
}

/// Gives every replaced long-span link a path once its virtual chain is final.
pub fn stitch(g: &mut SankeyGraph, config: &SankeyConfig) {
    for li in 0..g.links.len() {
        let LinkKind::Replaced { legs, waypoints } = &g.links[li].kind else {
            continue;
        };
        let path = match config.virtual_route {
            VirtualRoute::Chained => chained(g, legs),
            VirtualRoute::Curved => curved(g, li, waypoints),
            VirtualRoute::Direct => {
                let l = &g.links[li];
                let (s, t) = (&g.nodes[l.source], &g.nodes[l.target]);
                let between = intermediate_nodes(g, s.column, t.column);
                if crosses_nodes(g, (s.x1, l.y0), (t.x0, l.y1), l.width, &between) {
                    curved(g, li, waypoints)
                } else {
                    horizontal_link(s.x1, l.y0, t.x0, l.y1)
                }
            }
        };
        g.links[li].path = path;
    }
}

/// Leg paths joined by straight runs across the virtual nodes.
fn chained(g: &SankeyGraph, legs: &[usize]) -> LinkPath {
    let mut cmds: Vec<PathCommand> = Vec::new();
    for &leg in legs {
        let mut iter = g.links[leg].path.0.iter().copied();
        match iter.next() {
            Some(PathCommand::MoveTo { x, y }) if !cmds.is_empty() => {
                cmds.push(PathCommand::LineTo { x, y });
            }
            Some(first) => cmds.push(first),
            None => continue,
        }
        cmds.extend(iter);
    }
    LinkPath(cmds)
}

/// A smooth curve through the chain's waypoints, leaving and entering horizontally.
fn curved(g: &SankeyGraph, li: usize, waypoints: &[usize]) -> LinkPath {
    let l = &g.links[li];
    let (s, t) = (&g.nodes[l.source], &g.nodes[l.target]);
    let mut points = Vec::with_capacity(waypoints.len() + 2);
    points.push((s.x1, l.y0));
    for &wi in waypoints {
        let w = &g.nodes[wi];
        points.push(((w.x0 + w.x1) / 2.0, w.center()));
    }
    points.push((t.x0, l.y1));
    smooth_through(&points)
}

fn smooth_through(points: &[(f64, f64)]) -> LinkPath {
    let n = points.len();
    let Some(&first) = points.first() else {
        return LinkPath::default();
    };
    let tangent = |i: usize| -> (f64, f64) {
        if i == 0 {
            (points[1].0 - points[0].0, 0.0)
        } else if i == n - 1 {
            (points[n - 1].0 - points[n - 2].0, 0.0)
        } else {
            (
                (points[i + 1].0 - points[i - 1].0) / 2.0,
                (points[i + 1].1 - points[i - 1].1) / 2.0,
            )
        }
    };
    let mut cmds = vec![PathCommand::MoveTo {
        x: first.0,
        y: first.1,
    }];
    for i in 0..n.saturating_sub(1) {
        let (a, b) = (points[i], points[i + 1]);
        let (ta, tb) = (tangent(i), tangent(i + 1));
        cmds.push(PathCommand::CubicTo {
            x1: a.0 + ta.0 / 3.0,
            y1: a.1 + ta.1 / 3.0,
            x2: b.0 - tb.0 / 3.0,
            y2: b.1 - tb.1 / 3.0,
            x: b.0,
            y: b.1,
        });
    }
    LinkPath(cmds)
}
