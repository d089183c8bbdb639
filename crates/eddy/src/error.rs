use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Source,
    Target,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Source => f.write_str("source"),
            EndpointRole::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing input: no {what} supplied")]
    MissingInput { what: &'static str },
    #[error("duplicate node id {id}")]
    DuplicateNode { id: String },
    #[error("link {link} references unknown {role} node {id}")]
    UnresolvedReference {
        link: usize,
        role: EndpointRole,
        id: String,
    },
    #[error("node {node} has no column key but column ordering is by key")]
    MissingColumnKey { node: String },
    #[error("cycle through node {node} was not broken by circular link selection")]
    UnbrokenCycle { node: usize },
    #[error("invalid config: {message}")]
    InvalidConfig { message: String },
    #[error("invalid input at line {line}: {message}")]
    InvalidInput { line: usize, message: String },
    #[error("input JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
