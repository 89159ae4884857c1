//! Error taxonomy shared by the chain adapter, the store and the query facade.
use thiserror::Error;

use crate::types::Quantity;

/// Everything that can go wrong inside the indexer.
///
/// `Fetch`, `Rpc` and `BlockNotFound` are transport-side failures talking to
/// the chain; `Decode` covers malformed payloads; `InvalidAddress` is raised
/// at the query boundary; `Store` is reserved for the store backend.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// The request never produced a usable response (connection, HTTP status, timeout).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message reported by the node.
        message: String,
    },

    /// The node has no block at this height yet.
    #[error("block {0} not found")]
    BlockNotFound(Quantity),

    /// Malformed quantity, address or block payload.
    #[error("decode error: {0}")]
    Decode(String),

    /// Address input rejected at the query boundary.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The store backend failed.
    #[error("store error: {0}")]
    Store(String),
}

impl IndexerError {
    /// True for failures that originate in talking to the chain.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            IndexerError::Fetch(_) | IndexerError::Rpc { .. } | IndexerError::BlockNotFound(_)
        )
    }
}

impl From<serde_json::Error> for IndexerError {
    fn from(e: serde_json::Error) -> Self {
        IndexerError::Decode(e.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, IndexerError>;
