//! Error types for topology lookup and validation

use thiserror::Error;

/// Errors raised while interpreting a topology entry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// No node with this identifier exists in the table
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// The peer identifier is not a valid libp2p peer id
    #[error("Invalid peer id for node {node}: {reason}")]
    InvalidPeerId { node: String, reason: String },

    /// The private key is not 32 bytes of hex
    #[error("Invalid private key for node {node}: {reason}")]
    InvalidPrivateKey { node: String, reason: String },

    /// The p2p address could not be assembled
    #[error("Invalid multiaddr for node {node}: {reason}")]
    InvalidMultiaddr { node: String, reason: String },
}

/// Violations of the topology uniqueness invariants
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanityError {
    #[error("All private keys must be unique")]
    DuplicatePrivateKeys,

    #[error("All API ports must be unique")]
    DuplicateApiPorts,

    #[error("All p2p ports must be unique")]
    DuplicateP2pPorts,

    #[error("All peer ids must be unique")]
    DuplicatePeerIds,

    /// A single entry failed field-level validation (strict mode only)
    #[error(transparent)]
    InvalidEntry(#[from] TopologyError),
}

impl SanityError {
    /// Name of the colliding dimension, if this is a uniqueness violation
    pub fn dimension(&self) -> Option<&'static str> {
        match self {
            SanityError::DuplicatePrivateKeys => Some("private_key"),
            SanityError::DuplicateApiPorts => Some("api_port"),
            SanityError::DuplicateP2pPorts => Some("p2p_port"),
            SanityError::DuplicatePeerIds => Some("peer_id"),
            SanityError::InvalidEntry(_) => None,
        }
    }
}

/// Result type for topology operations
pub type Result<T> = std::result::Result<T, TopologyError>;
