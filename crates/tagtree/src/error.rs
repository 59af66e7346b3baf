use crate::types::NodeId;
use thiserror::Error;

/// Failures reported by parsing and tree operations.
///
/// Malformed markup is never an error; the tokenizer and tree builder recover
/// from it. Errors are reserved for structural limits and API misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Nesting exceeded the configured maximum depth.
    #[error("maximum nesting depth of {max} exceeded")]
    DepthLimit { max: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The reference node is not a child of the given parent.
    #[error("node {node} is not a child of {parent}")]
    NotAChild { parent: NodeId, node: NodeId },

    /// An id operation was used on a document parsed without id tracking.
    #[error("id tracking is not enabled for this document")]
    IdTrackingDisabled,

    #[error("node {0} does not belong to this document")]
    UnknownNode(NodeId),

    /// The writer passed to [`Document::write_to`](crate::Document::write_to) failed.
    #[error("output writer failed")]
    Format(#[from] std::fmt::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
