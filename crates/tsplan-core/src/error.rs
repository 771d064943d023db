use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed operation spec (e.g. a scan naming both a bucket and a bucket ID).
    #[error("Invalid spec: {0}")]
    Spec(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Duplicate edge: {parent} -> {child}")]
    DuplicateEdge { parent: String, child: String },

    #[error("Edge {parent} -> {child} would introduce a cycle")]
    Cycle { parent: String, child: String },

    /// Every physical scan must carry resolved bounds before execution.
    #[error("Unbounded scan(s) in physical plan: {}", nodes.join(", "))]
    UnboundedScan { nodes: Vec<String> },

    #[error("Rule engine did not reach a fixed point within {limit} rewrites")]
    FixedPoint { limit: usize },

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
