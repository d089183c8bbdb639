//! Column Assigner: topological depth/height (circular links excluded) and node alignment, or
//! columns taken straight from an external ordering key.

use crate::config::{ColumnOrdering, NodeAlign, SankeyConfig};
use crate::error::{Error, Result};
use crate::model::SankeyGraph;
use crate::util::f64_cmp;

pub fn run(g: &mut SankeyGraph, config: &SankeyConfig) -> Result<()> {
    match config.column_ordering {
        ColumnOrdering::Key => assign_by_key(g)?,
        ColumnOrdering::Topological => {
            compute_node_depths(g)?;
            compute_node_heights(g)?;
            let layers = g.nodes.iter().map(|n| n.depth).max().unwrap_or(0) + 1;
            for ni in 0..g.nodes.len() {
                let column = align(g, ni, layers, config.node_align);
                g.nodes[ni].column = column;
            }
        }
    }
    tracing::debug!(columns = g.max_column() + 1, "assigned columns");
    Ok(())
}

fn assign_by_key(g: &mut SankeyGraph) -> Result<()> {
    let mut keyed: Vec<(usize, f64)> = Vec::with_capacity(g.nodes.len());
    for n in &g.nodes {
        let key = n.column_key.ok_or_else(|| Error::MissingColumnKey {
            node: format!("#{}", n.index),
        })?;
        keyed.push((n.index, key));
    }
    keyed.sort_by(|a, b| f64_cmp(a.1, b.1));

    let mut column = 0usize;
    let mut prev: Option<f64> = None;
    for &(ni, key) in &keyed {
        if prev.is_some_and(|p| p != key) {
            column += 1;
        }
        prev = Some(key);
        g.nodes[ni].column = column;
        g.nodes[ni].depth = column;
    }
    let max_column = column;
    for n in &mut g.nodes {
        n.height = max_column - n.column;
    }
    Ok(())
}

fn compute_node_depths(g: &mut SankeyGraph) -> Result<()> {
    let n = g.nodes.len();
    let mut current: Vec<usize> = (0..n).collect();
    let mut next: Vec<usize> = Vec::new();
    let mut next_seen = vec![false; n];
    let mut x: usize = 0;
    while !current.is_empty() {
        for &ni in &current {
            g.nodes[ni].depth = x;
            for &li in &g.nodes[ni].source_links {
                let link = &g.links[li];
                if link.circular {
                    continue;
                }
                if !next_seen[link.target] {
                    next_seen[link.target] = true;
                    next.push(link.target);
                }
            }
        }
        x += 1;
        if x > n {
            return Err(Error::UnbrokenCycle {
                node: next.first().copied().unwrap_or(0),
            });
        }
        current = std::mem::take(&mut next);
        next_seen.fill(false);
    }
    Ok(())
}

fn compute_node_heights(g: &mut SankeyGraph) -> Result<()> {
    let n = g.nodes.len();
    let mut current: Vec<usize> = (0..n).collect();
    let mut next: Vec<usize> = Vec::new();
    let mut next_seen = vec![false; n];
    let mut x: usize = 0;
    while !current.is_empty() {
        for &ni in &current {
            g.nodes[ni].height = x;
            for &li in &g.nodes[ni].target_links {
                let link = &g.links[li];
                if link.circular {
                    continue;
                }
                if !next_seen[link.source] {
                    next_seen[link.source] = true;
                    next.push(link.source);
                }
            }
        }
        x += 1;
        if x > n {
            return Err(Error::UnbrokenCycle {
                node: next.first().copied().unwrap_or(0),
            });
        }
        current = std::mem::take(&mut next);
        next_seen.fill(false);
    }
    Ok(())
}

fn align(g: &SankeyGraph, ni: usize, layers: usize, mode: NodeAlign) -> usize {
    let node = &g.nodes[ni];
    let forward_out = || {
        node.source_links
            .iter()
            .filter(|&&li| !g.links[li].circular)
    };
    let has_in = node
        .target_links
        .iter()
        .any(|&li| !g.links[li].circular);
    let last = layers as i64 - 1;
    let raw = match mode {
        NodeAlign::Left => node.depth as i64,
        NodeAlign::Right => last - node.height as i64,
        NodeAlign::Justify => {
            if forward_out().next().is_some() {
                node.depth as i64
            } else {
                last
            }
        }
        NodeAlign::Center => {
            if has_in {
                node.depth as i64
            } else {
                forward_out()
                    .map(|&li| g.nodes[g.links[li].target].depth as i64 - 1)
                    .min()
                    .unwrap_or(0)
            }
        }
    };
    raw.clamp(0, last) as usize
}
