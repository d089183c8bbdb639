#![forbid(unsafe_code)]

//! Sankey layout for flow graphs that may contain cycles.
//!
//! Links that close a cycle are routed as circular links through a band above or below the flow.
//! The layout is a pure function of its input: nodes and links go in, node rectangles, link ports
//! and SVG-ready link paths come out.

pub mod band;
pub mod bind;
pub mod breadth;
pub mod column;
pub mod config;
pub mod cycles;
pub mod error;
pub mod extent;
pub mod input;
pub mod model;
pub mod output;
pub mod path;
pub mod pipeline;
pub mod ports;
pub mod record;
pub mod util;
pub mod virtual_nodes;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::{
    BreadthOrdering, ColumnOrdering, LinkTypeStyle, NodeAlign, SankeyConfig, VirtualRoute,
};
pub use error::{EndpointRole, Error, Result};
pub use input::{parse_csv, parse_json};
pub use model::{Band, Bounds, Margins};
pub use output::{LegendEntry, LinkLayout, NodeLayout, SankeyLayout};
pub use path::{CircularGeometry, LinkPath, PathCommand};
pub use pipeline::{layout, layout_by, layout_input, layout_with};
pub use record::{
    Endpoint, LinkData, LinkRecord, NodeAttrs, NodeData, NodeRecord, SankeyInput,
};
