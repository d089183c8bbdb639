//! Sankey layout pipeline.
//!
//! This module hosts the public entrypoints (`layout`, `layout_by`, `layout_with`, `layout_input`)
//! and keeps `lib.rs` focused on crate-level exports.

use crate::band::{self, Phase};
use crate::config::SankeyConfig;
use crate::error::Result;
use crate::model::SankeyGraph;
use crate::output::{self, SankeyLayout};
use crate::record::{LinkRecord, NodeAttrs, NodeRecord, SankeyInput};
use crate::{bind, breadth, column, cycles, extent, path, ports, virtual_nodes};
use std::fmt::Debug;
use std::hash::Hash;

/// Lays out records that know their own identifiers.
pub fn layout<N, L>(
    nodes: &[N],
    links: &[L],
    config: &SankeyConfig,
) -> Result<SankeyLayout<N::Id>>
where
    N: NodeRecord,
    L: LinkRecord<N::Id>,
{
    let ids: Vec<N::Id> = nodes.iter().map(NodeRecord::id).collect();
    let attrs: Vec<NodeAttrs> = nodes
        .iter()
        .map(|n| NodeAttrs {
            fixed_value: n.fixed_value(),
            column_key: n.column_key(),
            breadth_key: n.breadth_key(),
        })
        .collect();
    run(&ids, &attrs, links, config)
}

/// Lays out arbitrary node records, identified by `node_id`.
///
/// Every node gets default [`NodeAttrs`]: values come from incident links and there are no
/// ordering keys, so `ColumnOrdering::Key` fails with `MissingColumnKey`. Use [`layout_with`] to
/// supply them.
pub fn layout_by<T, K, F, L>(
    nodes: &[T],
    node_id: F,
    links: &[L],
    config: &SankeyConfig,
) -> Result<SankeyLayout<K>>
where
    F: Fn(&T) -> K,
    K: Clone + Eq + Hash + Debug,
    L: LinkRecord<K>,
{
    layout_with(nodes, node_id, |_| NodeAttrs::default(), links, config)
}

/// Lays out arbitrary node records, with `node_attrs` supplying fixed values and ordering keys.
pub fn layout_with<T, K, F, A, L>(
    nodes: &[T],
    node_id: F,
    node_attrs: A,
    links: &[L],
    config: &SankeyConfig,
) -> Result<SankeyLayout<K>>
where
    F: Fn(&T) -> K,
    A: Fn(&T) -> NodeAttrs,
    K: Clone + Eq + Hash + Debug,
    L: LinkRecord<K>,
{
    let ids: Vec<K> = nodes.iter().map(node_id).collect();
    let attrs: Vec<NodeAttrs> = nodes.iter().map(node_attrs).collect();
    run(&ids, &attrs, links, config)
}

pub fn layout_input(input: SankeyInput, config: &SankeyConfig) -> Result<SankeyLayout<String>> {
    let (nodes, links) = input.into_parts()?;
    layout(&nodes, &links, config)
}

fn run<K, L>(
    ids: &[K],
    attrs: &[NodeAttrs],
    links: &[L],
    config: &SankeyConfig,
) -> Result<SankeyLayout<K>>
where
    K: Clone + Eq + Hash + Debug,
    L: LinkRecord<K>,
{
    config.validate()?;
    let span = tracing::debug_span!("sankey_layout", nodes = ids.len(), links = links.len());
    let _guard = span.enter();

    let mut g = bind::run(ids, attrs, links)?;
    compute(&mut g, config)?;
    Ok(output::build(&g, ids, config))
}

/// Runs every stage after binding on `g`.
///
/// Band selection, extents, breadths, ports and paths depend on each other, so they are repeated
/// `layout_passes` times; the first pass uses the geometry-free band assignment.
pub fn compute(g: &mut SankeyGraph, config: &SankeyConfig) -> Result<()> {
    cycles::run(g, config)?;
    column::run(g, config)?;
    virtual_nodes::run(g, config);
    band::select(g, Phase::Initial);

    for pass in 0..config.layout_passes.max(1) {
        if pass > 0 {
            band::select(g, Phase::Refine);
        }
        extent::scale(g, config);
        breadth::run(g, config);
        ports::run(g, config);
        path::run(g, config);
        tracing::trace!(pass, "layout pass complete");
    }

    extent::adjust(g, config);
    virtual_nodes::undo(g);
    path::stitch(g, config);
    Ok(())
}
