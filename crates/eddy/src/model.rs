//! The layout graph threaded through every pipeline stage.
//!
//! Nodes and links live in two owned tables and refer to each other by index only. Virtual
//! elements are appended to the same tables and flagged, so an index handed out by one stage stays
//! valid for every later stage.

use crate::path::{CircularGeometry, LinkPath};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Top,
    Bottom,
}

impl Band {
    pub fn opposite(self) -> Self {
        match self {
            Band::Top => Band::Bottom,
            Band::Bottom => Band::Top,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Bounds {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// Room reserved around the node area for circular link bundles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub index: usize,
    /// Index of the caller's record; `None` for virtual nodes.
    pub record: Option<usize>,
    /// The replaced link a virtual node carries.
    pub virtual_of: Option<usize>,
    pub fixed_value: Option<f64>,
    pub column_key: Option<f64>,
    pub breadth_key: Option<f64>,
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
    pub source_links: Vec<usize>,
    pub target_links: Vec<usize>,
}

impl Node {
    pub fn is_virtual(&self) -> bool {
        self.record.is_none()
    }

    pub fn center(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }

    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn breadth(&self) -> f64 {
        self.y1 - self.y0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LinkKind {
    #[default]
    Real,
    /// One leg of a split long-span link.
    Virtual { replaced: usize },
    /// A long-span link carried by a chain of virtual legs through virtual waypoint nodes.
    Replaced {
        legs: Vec<usize>,
        waypoints: Vec<usize>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Link {
    pub index: usize,
    /// Index of the caller's record; `None` for virtual legs.
    pub record: Option<usize>,
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub width: f64,
    pub circular: bool,
    pub circular_id: Option<usize>,
    pub band: Option<Band>,
    /// Set by congestion relief; later heuristic passes leave the band alone.
    pub band_forced: bool,
    pub y0: f64,
    pub y1: f64,
    pub kind: LinkKind,
    pub link_type: Option<String>,
    pub path: LinkPath,
    pub geometry: Option<CircularGeometry>,
}

impl Link {
    pub fn is_self(&self) -> bool {
        self.source == self.target
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, LinkKind::Virtual { .. })
    }

    pub fn is_replaced(&self) -> bool {
        matches!(self.kind, LinkKind::Replaced { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SankeyGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    /// Drawable canvas area.
    pub bounds: Bounds,
    /// Node area after circular margins are reserved.
    pub inner: Bounds,
    pub margins: Margins,
    /// Value-to-pixel factor shared by every node and link.
    pub scale: f64,
    /// Effective vertical gap between nodes of one column.
    pub padding: f64,
}

impl SankeyGraph {
    /// Links taking part in the layout: everything except long-span links whose chain is active.
    pub fn active_links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.links.iter().filter(|l| !l.is_replaced())
    }

    pub fn circular_links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.links.iter().filter(|l| l.circular && !l.is_replaced())
    }

    pub fn max_column(&self) -> usize {
        self.nodes.iter().map(|n| n.column).max().unwrap_or(0)
    }

    /// Node indices grouped by column, each group in node-index order.
    pub fn columns(&self) -> Vec<Vec<usize>> {
        let mut columns: Vec<Vec<usize>> = vec![Vec::new(); self.max_column() + 1];
        for n in &self.nodes {
            columns[n.column].push(n.index);
        }
        columns
    }

    /// Column distance covered by a link (always non-negative).
    pub fn column_span(&self, link: usize) -> usize {
        let l = &self.links[link];
        self.nodes[l.source]
            .column
            .abs_diff(self.nodes[l.target].column)
    }

    /// Circular links attached to `node` whose other end is a different node.
    pub fn non_self_circular_count(&self, node: usize) -> usize {
        let n = &self.nodes[node];
        n.source_links
            .iter()
            .chain(n.target_links.iter())
            .filter(|&&li| self.links[li].circular && !self.links[li].is_self())
            .count()
    }

    pub fn push_node(&mut self, mut node: Node) -> usize {
        let idx = self.nodes.len();
        node.index = idx;
        self.nodes.push(node);
        idx
    }

    pub fn push_link(&mut self, mut link: Link) -> usize {
        let idx = self.links.len();
        link.index = idx;
        self.links.push(link);
        idx
    }
}
