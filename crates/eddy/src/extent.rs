//! Extent Scaler and Extent Adjuster.
//!
//! `scale` fixes the value-to-pixel factor, link widths, the margins reserved for circular
//! bundles, and every node's horizontal extent. `adjust` runs after all geometry is final and only
//! ever shrinks the drawing vertically, rebuilding link paths at the new size.

use crate::config::SankeyConfig;
use crate::model::{Band, Bounds, Margins, SankeyGraph};
use crate::path;

pub fn scale(g: &mut SankeyGraph, config: &SankeyConfig) {
    let bounds = Bounds {
        x0: config.padding,
        y0: config.padding,
        x1: config.width - config.padding,
        y1: config.height - config.padding,
    };
    g.bounds = bounds;
    let height = bounds.height();
    let columns = g.columns();

    let crowded = columns.iter().map(Vec::len).max().unwrap_or(0);
    let mut py = config.node_padding;
    if crowded > 1 {
        let cap = height / 2.0 / (crowded - 1) as f64;
        if py > cap {
            py = cap.max(config.min_node_padding);
        }
    }
    g.padding = py;

    let mut ky = fit_scale(g, config, &columns, height, py);
    set_link_widths(g, ky);

    let margins = circular_margins(g, config);
    let (top, bottom) = shrink(height, margins.top, margins.bottom);
    let (left, right) = shrink(bounds.width(), margins.left, margins.right);
    g.inner = Bounds {
        x0: bounds.x0 + left,
        y0: bounds.y0 + top,
        x1: bounds.x1 - right,
        y1: bounds.y1 - bottom,
    };
    g.margins = margins;

    ky = fit_scale(g, config, &columns, g.inner.height(), py);
    g.scale = ky;
    set_link_widths(g, ky);
    place_columns(g, config.node_width);

    tracing::debug!(
        scale = ky,
        padding = py,
        top = margins.top,
        bottom = margins.bottom,
        "scaled extents"
    );
}

/// Column-wise minimum of available height over total (non-virtual) value.
fn fit_scale(
    g: &SankeyGraph,
    config: &SankeyConfig,
    columns: &[Vec<usize>],
    height: f64,
    py: f64,
) -> f64 {
    let mut ky = f64::INFINITY;
    for column in columns {
        let total: f64 = column
            .iter()
            .filter(|&&ni| !g.nodes[ni].is_virtual())
            .map(|&ni| g.nodes[ni].value)
            .sum();
        if total <= 0.0 {
            continue;
        }
        let reserve: f64 = column
            .iter()
            .map(|&ni| config.circular_link_gap * circular_port_depth(g, ni) as f64)
            .sum();
        let available = height - (column.len() as f64 - 1.0) * py - reserve;
        ky = ky.min(available / total);
    }
    if !ky.is_finite() || ky < 0.0 {
        return 0.0;
    }
    ky
}

/// Largest number of circular links stacked on one side of a node.
fn circular_port_depth(g: &SankeyGraph, ni: usize) -> usize {
    let n = &g.nodes[ni];
    let count = |list: &[usize]| list.iter().filter(|&&li| g.links[li].circular).count();
    count(&n.source_links).max(count(&n.target_links))
}

fn set_link_widths(g: &mut SankeyGraph, ky: f64) {
    for l in &mut g.links {
        l.width = l.value * ky;
    }
}

/// Margins needed around the node area so circular bundles stay on the canvas.
///
/// Besides the link widths, every band reserves one gap per stacked link and every side one gap
/// per fanned arc.
pub fn circular_margins(g: &SankeyGraph, config: &SankeyConfig) -> Margins {
    let max_column = g.max_column();
    let mut m = Margins::default();
    let mut stacked = [0usize; 4];
    for l in g.circular_links() {
        let fans = !l.is_self();
        match l.band {
            Some(Band::Top) => {
                m.top += l.width;
                stacked[0] += usize::from(fans);
            }
            _ => {
                m.bottom += l.width;
                stacked[1] += usize::from(fans);
            }
        }
        if g.nodes[l.target].column == 0 {
            m.left += l.width;
            stacked[2] += usize::from(fans);
        }
        if g.nodes[l.source].column == max_column {
            m.right += l.width;
            stacked[3] += usize::from(fans);
        }
    }
    let pad = |v: f64, count: usize| {
        if v > 0.0 {
            v + count.saturating_sub(1) as f64 * config.circular_link_gap
                + config.circular_margin
                + config.base_arc_radius
        } else {
            v
        }
    };
    Margins {
        top: pad(m.top, stacked[0]),
        bottom: pad(m.bottom, stacked[1]),
        left: pad(m.left, stacked[2]),
        right: pad(m.right, stacked[3]),
    }
}

/// Insets for two opposing margins. They are reserved in full while they take at most half of
/// `extent`, otherwise scaled down together to that half.
fn shrink(extent: f64, a: f64, b: f64) -> (f64, f64) {
    let total = a + b;
    if total <= 0.0 || extent <= 0.0 {
        return (0.0, 0.0);
    }
    let k = (extent / 2.0 / total).min(1.0);
    (a * k, b * k)
}

fn place_columns(g: &mut SankeyGraph, node_width: f64) {
    let max_column = g.max_column();
    let inner = g.inner;
    let step = if max_column == 0 {
        0.0
    } else {
        (inner.width() - node_width) / max_column as f64
    };
    for n in &mut g.nodes {
        n.x0 = if max_column == 0 {
            inner.x0 + (inner.width() - node_width) / 2.0
        } else {
            inner.x0 + n.column as f64 * step
        };
        n.x1 = n.x0 + node_width;
    }
}

/// Vertical range covered by nodes, circular link strokes and ordinary link strokes.
pub fn occupied_extent(g: &SankeyGraph) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for n in &g.nodes {
        lo = lo.min(n.y0);
        hi = hi.max(n.y1);
    }
    for l in &g.links {
        let half = l.width / 2.0;
        let range = match &l.geometry {
            Some(geom) if l.circular => Some((geom.vertical_full_extent, geom.vertical_full_extent)),
            _ if !l.circular => l.path.y_range(),
            _ => None,
        };
        if let Some((top, bottom)) = range {
            lo = lo.min(top - half);
            hi = hi.max(bottom + half);
        }
    }
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

/// Shrinks the drawing to the canvas height if it overflows. Returns whether anything moved.
///
/// Node breadths, ports and widths shrink by one ratio and every path is rebuilt from them, so
/// circular bundles keep the configured gap, margin and arc radius. The ratio is the largest one
/// found whose rebuilt drawing fits. When those fixed lengths alone exceed the canvas, they
/// shrink by the same ratio as everything else.
pub fn adjust(g: &mut SankeyGraph, config: &SankeyConfig) -> bool {
    let Some((lo, hi)) = occupied_extent(g) else {
        return false;
    };
    let available = g.bounds.height();
    let occupied = hi - lo;
    if !(occupied > available) || available <= 0.0 {
        return false;
    }

    let saved = Breadths::take(g);
    let fixed = saved
        .apply(g, config, 0.0, 0.0)
        .map_or(f64::INFINITY, |(a, b)| b - a);
    let (ratio, lengths) = match fit_ratio(g, config, &saved, fixed, occupied, available) {
        Some(ratio) => (ratio, config.clone()),
        None => {
            let ratio = available / occupied;
            (ratio, with_circular_lengths(config, ratio))
        }
    };
    let top = saved
        .apply(g, &lengths, ratio, 0.0)
        .map_or(g.bounds.y0, |(a, _)| a);
    let shift = g.bounds.y0 - top;
    saved.apply(g, &lengths, ratio, shift);

    tracing::debug!(
        ratio,
        occupied,
        available,
        fixed,
        "shrunk drawing to canvas height"
    );
    true
}

/// Rebuild attempts made while searching for the fitting ratio.
const FIT_STEPS: usize = 12;

/// False position between the collapsed drawing (ratio 0, height `fixed`) and the measured one
/// (ratio 1). Every attempt is rebuilt and measured; only attempts that fit are kept.
fn fit_ratio(
    g: &mut SankeyGraph,
    config: &SankeyConfig,
    saved: &Breadths,
    fixed: f64,
    occupied: f64,
    available: f64,
) -> Option<f64> {
    if !(fixed < available) {
        return None;
    }
    let tolerance = available * 1e-9;
    let (mut lo_r, mut lo_h) = (0.0, fixed);
    let (mut hi_r, mut hi_h) = (1.0, occupied);
    let mut best = None;
    for _ in 0..FIT_STEPS {
        if !(hi_h > lo_h) {
            break;
        }
        let r = lo_r + (available - lo_h) * (hi_r - lo_r) / (hi_h - lo_h);
        let Some((a, b)) = saved.apply(g, config, r, 0.0) else {
            break;
        };
        let h = b - a;
        if h <= available {
            best = Some(r);
            if available - h <= tolerance {
                break;
            }
            (lo_r, lo_h) = (r, h);
        } else {
            (hi_r, hi_h) = (r, h);
        }
    }
    best
}

fn with_circular_lengths(config: &SankeyConfig, ratio: f64) -> SankeyConfig {
    SankeyConfig {
        circular_link_gap: config.circular_link_gap * ratio,
        circular_margin: config.circular_margin * ratio,
        base_arc_radius: config.base_arc_radius * ratio,
        self_loop_margin: config.self_loop_margin * ratio,
        ..config.clone()
    }
}

/// The value-proportional vertical state: node extents, ports and widths.
struct Breadths {
    nodes: Vec<(f64, f64)>,
    links: Vec<(f64, f64, f64)>,
    inner: (f64, f64),
    scale: f64,
    padding: f64,
}

impl Breadths {
    fn take(g: &SankeyGraph) -> Self {
        Self {
            nodes: g.nodes.iter().map(|n| (n.y0, n.y1)).collect(),
            links: g.links.iter().map(|l| (l.y0, l.y1, l.width)).collect(),
            inner: (g.inner.y0, g.inner.y1),
            scale: g.scale,
            padding: g.padding,
        }
    }

    /// Scales the saved state by `ratio` about the canvas top, moves it by `shift`, rebuilds the
    /// paths and measures the result.
    fn apply(
        &self,
        g: &mut SankeyGraph,
        config: &SankeyConfig,
        ratio: f64,
        shift: f64,
    ) -> Option<(f64, f64)> {
        let top = g.bounds.y0;
        let map = |y: f64| top + (y - top) * ratio + shift;
        for (n, &(y0, y1)) in g.nodes.iter_mut().zip(&self.nodes) {
            n.y0 = map(y0);
            n.y1 = map(y1);
        }
        for (l, &(y0, y1, width)) in g.links.iter_mut().zip(&self.links) {
            l.y0 = map(y0);
            l.y1 = map(y1);
            l.width = width * ratio;
        }
        g.inner.y0 = map(self.inner.0);
        g.inner.y1 = map(self.inner.1);
        g.scale = self.scale * ratio;
        g.padding = self.padding * ratio;
        path::run(g, config);
        occupied_extent(g)
    }
}
