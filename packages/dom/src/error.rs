//! Error types for the DOM

use crate::node::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Node {0:?} is not part of the document")]
    Disconnected(NodeId),

    #[error("Offset {offset} is out of range for node {node:?}")]
    OffsetOutOfRange { node: NodeId, offset: usize },

    #[error("Node {0:?} cannot hold a caret")]
    NotEditable(NodeId),
}
