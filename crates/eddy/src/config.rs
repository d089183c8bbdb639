//! Layout configuration.
//!
//! Every field has a default, so a partial JSON/JSON5 document (or `SankeyConfig::default()`)
//! is always a complete configuration.

use crate::error::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeAlign {
    Left,
    Right,
    Center,
    #[default]
    Justify,
}

/// How a long-span link that was split into a virtual chain is drawn once the chain is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VirtualRoute {
    /// One source-to-target curve, unless it would cross an intermediate node, in which case the
    /// curved route is used instead.
    #[default]
    Direct,
    /// A smooth curve through the chain's waypoints.
    Curved,
    /// The concatenated per-leg paths.
    Chained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnOrdering {
    #[default]
    Topological,
    /// Columns follow each node's `column_key`; circularity is decided by comparing keys.
    Key,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadthOrdering {
    #[default]
    Heuristic,
    /// Nodes within a column are ordered by `breadth_key` (nodes without one sort last).
    Key,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkTypeStyle {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SankeyConfig {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub node_align: NodeAlign,
    pub node_width: f64,
    pub node_padding: f64,
    pub min_node_padding: f64,
    pub virtual_nodes: bool,
    pub virtual_route: VirtualRoute,
    pub circular_link_gap: f64,
    pub circular_margin: f64,
    pub base_arc_radius: f64,
    pub self_loop_margin: f64,
    pub node_buffer: f64,
    pub iterations: usize,
    pub port_iterations: usize,
    pub layout_passes: usize,
    pub column_ordering: ColumnOrdering,
    pub breadth_ordering: BreadthOrdering,
    pub link_types: Vec<LinkTypeStyle>,
}

impl Default for SankeyConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
            padding: 0.0,
            node_align: NodeAlign::Justify,
            node_width: 24.0,
            node_padding: 8.0,
            min_node_padding: 2.0,
            virtual_nodes: true,
            virtual_route: VirtualRoute::Direct,
            circular_link_gap: 2.0,
            circular_margin: 25.0,
            base_arc_radius: 10.0,
            self_loop_margin: 5.0,
            node_buffer: 5.0,
            iterations: 32,
            port_iterations: 4,
            layout_passes: 2,
            column_ordering: ColumnOrdering::Topological,
            breadth_ordering: BreadthOrdering::Heuristic,
            link_types: Vec::new(),
        }
    }
}

impl SankeyConfig {
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("width", self.width),
            ("height", self.height),
            ("padding", self.padding),
            ("nodeWidth", self.node_width),
            ("nodePadding", self.node_padding),
            ("minNodePadding", self.min_node_padding),
            ("circularLinkGap", self.circular_link_gap),
            ("circularMargin", self.circular_margin),
            ("baseArcRadius", self.base_arc_radius),
            ("selfLoopMargin", self.self_loop_margin),
            ("nodeBuffer", self.node_buffer),
        ];
        for (name, v) in non_negative {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::InvalidConfig {
                    message: format!("{name} must be a finite, non-negative number (got {v})"),
                });
            }
        }
        if self.width <= 2.0 * self.padding || self.height <= 2.0 * self.padding {
            return Err(Error::InvalidConfig {
                message: "padding leaves no drawable area".to_string(),
            });
        }
        if self.node_width <= 0.0 || self.node_width >= self.width - 2.0 * self.padding {
            return Err(Error::InvalidConfig {
                message: format!("nodeWidth {} does not fit the canvas", self.node_width),
            });
        }
        Ok(())
    }
}
