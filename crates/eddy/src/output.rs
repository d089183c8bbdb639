//! The computed layout handed to renderers.

use crate::config::SankeyConfig;
use crate::model::{Band, Bounds, LinkKind, Margins, SankeyGraph};
use crate::path::{CircularGeometry, LinkPath};
use indexmap::IndexMap;
use serde::Serialize;

/// Colours for link types the configuration does not name, in first-use order.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyLayout<K> {
    pub bounds: Bounds,
    pub inner: Bounds,
    pub scale: f64,
    pub node_width: f64,
    pub node_padding: f64,
    pub margins: Margins,
    pub nodes: Vec<NodeLayout<K>>,
    pub links: Vec<LinkLayout<K>>,
    pub virtual_nodes: Vec<VirtualNodeLayout>,
    pub virtual_links: Vec<VirtualLinkLayout>,
    pub replaced_links: Vec<ReplacedLink>,
    pub legend: Vec<LegendEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLayout<K> {
    pub id: K,
    pub index: usize,
    pub value: f64,
    pub depth: usize,
    pub height: usize,
    pub column: usize,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub part_of_cycle: bool,
    pub band: Option<Band>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkLayout<K> {
    pub index: usize,
    pub source: K,
    pub target: K,
    pub value: f64,
    pub width: f64,
    /// Port centre on the source node.
    pub y0: f64,
    /// Port centre on the target node.
    pub y1: f64,
    pub circular: bool,
    pub circular_id: Option<usize>,
    pub band: Option<Band>,
    #[serde(rename = "type")]
    pub link_type: Option<String>,
    pub color: Option<String>,
    pub path: LinkPath,
    pub d: String,
    pub geometry: Option<CircularGeometry>,
}

/// A synthetic waypoint node. `index` counts from the end of the caller's node list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNodeLayout {
    pub index: usize,
    /// Index of the caller's link this node carries.
    pub carries: usize,
    pub value: f64,
    pub column: usize,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

/// One leg of a split long-span link. Endpoints index the caller's nodes, or virtual nodes when
/// at or beyond the caller's node count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualLinkLayout {
    pub index: usize,
    pub replaces: usize,
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub width: f64,
    pub y0: f64,
    pub y1: f64,
    pub path: LinkPath,
    pub d: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacedLink {
    pub link: usize,
    pub legs: Vec<usize>,
    pub waypoints: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub name: String,
    pub label: String,
    pub color: String,
    pub value: f64,
}

pub(crate) fn build<K: Clone>(g: &SankeyGraph, ids: &[K], config: &SankeyConfig) -> SankeyLayout<K> {
    let legend = legend(g, config);
    let color_of = |t: &str| {
        legend
            .iter()
            .find(|e| e.name == t)
            .map(|e| e.color.clone())
    };

    let mut nodes = Vec::with_capacity(ids.len());
    let mut virtual_nodes = Vec::new();
    for n in &g.nodes {
        match (n.record, n.virtual_of) {
            (Some(rec), _) => nodes.push(NodeLayout {
                id: ids[rec].clone(),
                index: rec,
                value: n.value,
                depth: n.depth,
                height: n.height,
                column: n.column,
                x0: n.x0,
                x1: n.x1,
                y0: n.y0,
                y1: n.y1,
                part_of_cycle: n.part_of_cycle,
                band: n.band,
            }),
            (None, Some(carried)) => virtual_nodes.push(VirtualNodeLayout {
                index: n.index,
                carries: g.links[carried].record.unwrap_or(carried),
                value: n.value,
                column: n.column,
                x0: n.x0,
                x1: n.x1,
                y0: n.y0,
                y1: n.y1,
            }),
            (None, None) => {}
        }
    }

    let mut links = Vec::new();
    let mut virtual_links = Vec::new();
    let mut replaced_links = Vec::new();
    for l in &g.links {
        match (&l.kind, l.record) {
            (LinkKind::Virtual { replaced }, _) => virtual_links.push(VirtualLinkLayout {
                index: l.index,
                replaces: g.links[*replaced].record.unwrap_or(*replaced),
                source: l.source,
                target: l.target,
                value: l.value,
                width: l.width,
                y0: l.y0,
                y1: l.y1,
                d: l.path.to_svg_d(),
                path: l.path.clone(),
            }),
            (kind, Some(rec)) => {
                if let LinkKind::Replaced { legs, waypoints } = kind {
                    replaced_links.push(ReplacedLink {
                        link: rec,
                        legs: legs.clone(),
                        waypoints: waypoints.clone(),
                    });
                }
                let (Some(s), Some(t)) = (g.nodes[l.source].record, g.nodes[l.target].record)
                else {
                    continue;
                };
                links.push(LinkLayout {
                    index: rec,
                    source: ids[s].clone(),
                    target: ids[t].clone(),
                    value: l.value,
                    width: l.width,
                    y0: l.y0,
                    y1: l.y1,
                    circular: l.circular,
                    circular_id: l.circular_id,
                    band: l.band,
                    link_type: l.link_type.clone(),
                    color: l.link_type.as_deref().and_then(color_of),
                    d: l.path.to_svg_d(),
                    path: l.path.clone(),
                    geometry: l.geometry,
                });
            }
            (_, None) => {}
        }
    }

    SankeyLayout {
        bounds: g.bounds,
        inner: g.inner,
        scale: g.scale,
        node_width: config.node_width,
        node_padding: g.padding,
        margins: g.margins,
        nodes,
        links,
        virtual_nodes,
        virtual_links,
        replaced_links,
        legend,
    }
}

/// Configured types in configuration order, then unconfigured ones in first-use order.
fn legend(g: &SankeyGraph, config: &SankeyConfig) -> Vec<LegendEntry> {
    let mut used: IndexMap<&str, f64> = IndexMap::new();
    for l in &g.links {
        if l.record.is_none() {
            continue;
        }
        if let Some(t) = l.link_type.as_deref() {
            *used.entry(t).or_insert(0.0) += l.value;
        }
    }

    let mut out = Vec::with_capacity(used.len());
    for style in &config.link_types {
        if let Some(&value) = used.get(style.name.as_str()) {
            out.push(LegendEntry {
                name: style.name.clone(),
                label: style.label.clone().unwrap_or_else(|| style.name.clone()),
                color: style.color.clone(),
                value,
            });
        }
    }
    let unconfigured = used
        .iter()
        .filter(|(name, _)| !config.link_types.iter().any(|s| s.name == **name));
    for (i, (name, &value)) in unconfigured.enumerate() {
        out.push(LegendEntry {
            name: name.to_string(),
            label: name.to_string(),
            color: DEFAULT_PALETTE[i % DEFAULT_PALETTE.len()].to_string(),
            value,
        });
    }
    out
}
