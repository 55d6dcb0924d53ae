use thiserror::Error;

use crate::NodeId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Mapping fingerprint mismatch: expected {expected}, found {found}")]
    Integrity { expected: String, found: String },
    #[error("No route between nodes {from} and {to}")]
    NoRoute { from: NodeId, to: NodeId },
    #[error("No nearby nodes found for snapping")]
    NoPointsFound,
    #[error("Invalid node index")]
    InvalidNodeIndex,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
