//! Graph Binder: resolve link endpoints and build per-node adjacency.

use crate::error::{EndpointRole, Error, Result};
use crate::model::{Link, Node, SankeyGraph};
use crate::record::{Endpoint, LinkRecord, NodeAttrs};
use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::hash::Hash;

pub(crate) fn run<K, L>(ids: &[K], attrs: &[NodeAttrs], links: &[L]) -> Result<SankeyGraph>
where
    K: Clone + Eq + Hash + Debug,
    L: LinkRecord<K>,
{
    if ids.is_empty() {
        return Err(Error::MissingInput { what: "nodes" });
    }

    let mut index: FxHashMap<&K, usize> = FxHashMap::default();
    index.reserve(ids.len());
    for (i, id) in ids.iter().enumerate() {
        if index.insert(id, i).is_some() {
            return Err(Error::DuplicateNode {
                id: format!("{id:?}"),
            });
        }
    }

    let mut g = SankeyGraph::default();
    for (i, a) in attrs.iter().enumerate() {
        g.push_node(Node {
            record: Some(i),
            fixed_value: a.fixed_value,
            column_key: a.column_key,
            breadth_key: a.breadth_key,
            ..Default::default()
        });
    }

    let resolve = |link: usize, role: EndpointRole, end: Endpoint<K>| -> Result<usize> {
        match end {
            Endpoint::Id(id) => index
                .get(&id)
                .copied()
                .ok_or_else(|| Error::UnresolvedReference {
                    link,
                    role,
                    id: format!("{id:?}"),
                }),
            Endpoint::Node(i) if i < ids.len() => Ok(i),
            Endpoint::Node(i) => Err(Error::UnresolvedReference {
                link,
                role,
                id: format!("#{i}"),
            }),
        }
    };

    for (i, rec) in links.iter().enumerate() {
        let source = resolve(i, EndpointRole::Source, rec.source())?;
        let target = resolve(i, EndpointRole::Target, rec.target())?;
        let raw = rec.value();
        let value = if raw.is_finite() { raw.max(0.0) } else { 0.0 };
        let li = g.push_link(Link {
            record: Some(i),
            source,
            target,
            value,
            link_type: rec.link_type().map(str::to_string),
            ..Default::default()
        });
        g.nodes[source].source_links.push(li);
        g.nodes[target].target_links.push(li);
    }

    compute_node_values(&mut g);
    Ok(g)
}

/// A node's value is the larger of its outgoing and incoming totals unless the record fixes it.
pub fn compute_node_values(g: &mut SankeyGraph) {
    for ni in 0..g.nodes.len() {
        let n = &g.nodes[ni];
        let out_sum: f64 = n.source_links.iter().map(|&li| g.links[li].value).sum();
        let in_sum: f64 = n.target_links.iter().map(|&li| g.links[li].value).sum();
        let value = match n.fixed_value {
            Some(v) if v.is_finite() => v.max(0.0),
            _ => out_sum.max(in_sum),
        };
        g.nodes[ni].value = value;
    }
}
