//! Circular Type Selector: route every circular link through the top or the bottom band.
//!
//! `select` with [`Phase::Initial`] needs no geometry and runs before the extents are scaled.
//! [`Phase::Refine`] runs between layout passes and uses node positions to steer links away from
//! crossings and to relieve congested targets. Both phases end with self-link banding, the
//! bidirectional pair synchronization and a recomputation of each node's predominant band.

use crate::model::{Band, SankeyGraph};
use crate::util::f64_cmp;
use std::collections::BTreeMap;

/// Backward links further apart than this share of the drawable height are banded by geometry.
const FAR_BACKLINK_RATIO: f64 = 0.3;
/// Top-band links into one target at which the longest one is moved to the bottom band.
const CONGESTION_THRESHOLD: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initial,
    Refine,
}

pub fn select(g: &mut SankeyGraph, phase: Phase) {
    match phase {
        Phase::Initial => assign_balanced(g),
        Phase::Refine => {
            band_by_geometry(g);
            let local = force_local_backlinks(g);
            settle_source_columns(g, &local);
            relieve_congestion(g);
        }
    }
    band_self_links(g);
    synchronize_bidirectional(g);
    update_node_bands(g);

    if tracing::enabled!(tracing::Level::DEBUG) {
        let top = g
            .circular_links()
            .filter(|l| l.band == Some(Band::Top))
            .count();
        let bottom = g
            .circular_links()
            .filter(|l| l.band == Some(Band::Bottom))
            .count();
        tracing::debug!(?phase, top, bottom, "selected circular bands");
    }
}

fn circular_indices(g: &SankeyGraph) -> Vec<usize> {
    g.circular_links().map(|l| l.index).collect()
}

/// Inherit an endpoint's band, else take the less populated band (ties go to the top).
fn assign_balanced(g: &mut SankeyGraph) {
    for n in &mut g.nodes {
        n.band = None;
    }
    let mut tops = 0usize;
    let mut bottoms = 0usize;
    for li in circular_indices(g) {
        let (s, t) = (g.links[li].source, g.links[li].target);
        let band = if g.links[li].band_forced {
            g.links[li].band.unwrap_or(Band::Bottom)
        } else if let Some(b) = g.nodes[s].band.or(g.nodes[t].band) {
            b
        } else if tops <= bottoms {
            Band::Top
        } else {
            Band::Bottom
        };
        match band {
            Band::Top => tops += 1,
            Band::Bottom => bottoms += 1,
        }
        g.links[li].band = Some(band);
        g.nodes[s].band = Some(band);
        g.nodes[t].band = Some(band);
    }
}

fn band_by_geometry(g: &mut SankeyGraph) {
    let far = FAR_BACKLINK_RATIO * g.bounds.height();
    for li in circular_indices(g) {
        let l = &g.links[li];
        if l.is_self() || l.band_forced {
            continue;
        }
        let (s, t) = (&g.nodes[l.source], &g.nodes[l.target]);
        let (sy, ty) = (s.center(), t.center());
        let band = if t.column > s.column {
            Some(if ty >= sy { Band::Top } else { Band::Bottom })
        } else if (ty - sy).abs() > far {
            Some(if ty < sy { Band::Top } else { Band::Bottom })
        } else {
            None
        };
        if let Some(b) = band {
            g.links[li].band = Some(b);
        }
    }
}

/// One-column backlinks between vertically nearby nodes go under the flow.
fn force_local_backlinks(g: &mut SankeyGraph) -> Vec<bool> {
    let mut local = vec![false; g.links.len()];
    for li in circular_indices(g) {
        let l = &g.links[li];
        if l.is_self() || l.band_forced {
            continue;
        }
        let (s, t) = (&g.nodes[l.source], &g.nodes[l.target]);
        if s.column != t.column + 1 {
            continue;
        }
        let separation = (s.center() - t.center()).abs();
        if separation <= s.breadth().max(t.breadth()) {
            g.links[li].band = Some(Band::Bottom);
            local[li] = true;
        }
    }
    local
}

/// Within a source column, a bottom link below a top link (in source order) heading upward would
/// cross it; send it over the top instead.
fn settle_source_columns(g: &mut SankeyGraph, local: &[bool]) {
    let mut by_column: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for l in g.circular_links() {
        if !l.is_self() {
            by_column
                .entry(g.nodes[l.source].column)
                .or_default()
                .push(l.index);
        }
    }
    for (_, mut links) in by_column {
        links.sort_by(|&a, &b| {
            let sa = g.nodes[g.links[a].source].center();
            let sb = g.nodes[g.links[b].source].center();
            f64_cmp(sa, sb).then_with(|| a.cmp(&b))
        });
        let mut seen_top = false;
        for li in links {
            let l = &g.links[li];
            match l.band {
                Some(Band::Top) => seen_top = true,
                Some(Band::Bottom) if seen_top && !l.band_forced && !local[li] => {
                    let target_above =
                        g.nodes[l.target].center() < g.nodes[l.source].center();
                    if target_above {
                        g.links[li].band = Some(Band::Top);
                    }
                }
                _ => {}
            }
        }
    }
}

fn relieve_congestion(g: &mut SankeyGraph) {
    for ti in 0..g.nodes.len() {
        let incoming: Vec<usize> = g.nodes[ti]
            .target_links
            .iter()
            .copied()
            .filter(|&li| g.links[li].circular && !g.links[li].is_self())
            .collect();
        let tops = incoming
            .iter()
            .filter(|&&li| g.links[li].band == Some(Band::Top))
            .count();
        let bottoms = incoming.len() - tops;
        if tops < CONGESTION_THRESHOLD || bottoms > 0 {
            continue;
        }
        let candidate = incoming
            .iter()
            .copied()
            .filter(|&li| {
                let l = &g.links[li];
                l.band == Some(Band::Top) && g.nodes[l.source].column >= g.nodes[l.target].column
            })
            .max_by(|&a, &b| {
                g.column_span(a)
                    .cmp(&g.column_span(b))
                    .then_with(|| f64_cmp(g.links[a].width, g.links[b].width))
                    .then_with(|| b.cmp(&a))
            });
        if let Some(li) = candidate {
            g.links[li].band = Some(Band::Bottom);
            g.links[li].band_forced = true;
            tracing::trace!(link = li, target = ti, "moved congested link to bottom band");
        }
    }
}

/// A self-loop takes the side its node's other circular links do not use.
fn band_self_links(g: &mut SankeyGraph) {
    for li in circular_indices(g) {
        let l = &g.links[li];
        if !l.is_self() || l.band_forced {
            continue;
        }
        let node = &g.nodes[l.source];
        let (mut tops, mut bottoms) = (0usize, 0usize);
        for &other in node.source_links.iter().chain(node.target_links.iter()) {
            let o = &g.links[other];
            if !o.circular || o.is_self() {
                continue;
            }
            match o.band {
                Some(Band::Top) => tops += 1,
                Some(Band::Bottom) => bottoms += 1,
                None => {}
            }
        }
        if tops + bottoms == 0 {
            continue;
        }
        let majority = if tops >= bottoms {
            Band::Top
        } else {
            Band::Bottom
        };
        g.links[li].band = Some(majority.opposite());
    }
}

/// Circular links in both directions between two nodes share the band of the heaviest link
/// (ties go to the top).
pub fn synchronize_bidirectional(g: &mut SankeyGraph) {
    let mut pairs: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for l in g.circular_links() {
        if l.is_self() {
            continue;
        }
        let key = (l.source.min(l.target), l.source.max(l.target));
        pairs.entry(key).or_default().push(l.index);
    }
    for ((a, _), links) in pairs {
        let forward = links.iter().any(|&li| g.links[li].source == a);
        let backward = links.iter().any(|&li| g.links[li].source != a);
        if !(forward && backward) {
            continue;
        }
        let heaviest = links
            .iter()
            .map(|&li| g.links[li].value)
            .fold(f64::NEG_INFINITY, f64::max);
        let bands: Vec<Band> = links
            .iter()
            .filter(|&&li| g.links[li].value == heaviest)
            .filter_map(|&li| g.links[li].band)
            .collect();
        let band = if bands.contains(&Band::Top) || bands.is_empty() {
            Band::Top
        } else {
            Band::Bottom
        };
        for li in links {
            g.links[li].band = Some(band);
        }
    }
}

/// A node's band is the one most of its circular links use (ties go to the top).
fn update_node_bands(g: &mut SankeyGraph) {
    for ni in 0..g.nodes.len() {
        let node = &g.nodes[ni];
        let (mut tops, mut bottoms) = (0usize, 0usize);
        let incoming = node
            .target_links
            .iter()
            .filter(|&&li| !g.links[li].is_self());
        for &li in node.source_links.iter().chain(incoming) {
            let l = &g.links[li];
            if !l.circular {
                continue;
            }
            match l.band {
                Some(Band::Top) => tops += 1,
                Some(Band::Bottom) => bottoms += 1,
                None => {}
            }
        }
        g.nodes[ni].band = match (tops, bottoms) {
            (0, 0) => None,
            (t, b) if t >= b => Some(Band::Top),
            _ => Some(Band::Bottom),
        };
    }
}
