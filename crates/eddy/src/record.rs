//! Caller-facing node and link records.
//!
//! The layout never looks inside a caller's record beyond these traits, so applications can lay
//! out their own types directly. `NodeData`/`LinkData` are ready-made records for JSON/CSV input.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt::Debug;
use std::hash::Hash;

/// A link end: an application identifier, or an index into the node slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint<K> {
    Id(K),
    Node(usize),
}

pub trait NodeRecord {
    type Id: Clone + Eq + Hash + Debug;

    fn id(&self) -> Self::Id;

    /// Overrides the value derived from incident links.
    fn fixed_value(&self) -> Option<f64> {
        None
    }

    /// External ordering key used by `ColumnOrdering::Key`.
    fn column_key(&self) -> Option<f64> {
        None
    }

    /// Secondary key used by `BreadthOrdering::Key`.
    fn breadth_key(&self) -> Option<f64> {
        None
    }
}

pub trait LinkRecord<K> {
    fn source(&self) -> Endpoint<K>;
    fn target(&self) -> Endpoint<K>;
    fn value(&self) -> f64;

    /// Type tag looked up in the configured link-type table.
    fn link_type(&self) -> Option<&str> {
        None
    }
}

/// Optional per-node attributes: the [`NodeRecord`] methods other than `id`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeAttrs {
    pub fixed_value: Option<f64>,
    pub column_key: Option<f64>,
    pub breadth_key: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeData {
    pub id: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub column: Option<f64>,
    #[serde(default)]
    pub sort: Option<f64>,
}

impl NodeData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: None,
            column: None,
            sort: None,
        }
    }
}

impl NodeRecord for NodeData {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn fixed_value(&self) -> Option<f64> {
        self.value
    }

    fn column_key(&self) -> Option<f64> {
        self.column
    }

    fn breadth_key(&self) -> Option<f64> {
        self.sort
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkData {
    pub source: String,
    pub target: String,
    pub value: f64,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl LinkData {
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
            kind: None,
        }
    }
}

impl LinkRecord<String> for LinkData {
    fn source(&self) -> Endpoint<String> {
        Endpoint::Id(self.source.clone())
    }

    fn target(&self) -> Endpoint<String> {
        Endpoint::Id(self.target.clone())
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn link_type(&self) -> Option<&str> {
        self.kind.as_deref()
    }
}

/// A whole graph document. Either array may be absent in the source text; that is reported when
/// the input is taken apart, not while deserializing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SankeyInput {
    #[serde(default)]
    pub nodes: Option<Vec<NodeData>>,
    #[serde(default)]
    pub links: Option<Vec<LinkData>>,
}

impl SankeyInput {
    pub fn into_parts(self) -> Result<(Vec<NodeData>, Vec<LinkData>)> {
        let nodes = self.nodes.ok_or(Error::MissingInput { what: "nodes" })?;
        let links = self.links.ok_or(Error::MissingInput { what: "links" })?;
        Ok((nodes, links))
    }
}
