#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! ethwatch: a polling transaction indexer for watched Ethereum addresses.
//!
//! ## What you plug in
//! - [`ChainSource`]: current chain head and blocks by number ([`EthClient`]
//!   provides it over any JSON-RPC [`RpcTransport`]).
//! - [`TransactionStore`]: subscriptions, the ingestion checkpoint and
//!   per-address transaction logs ([`MemoryStore`] keeps them in memory).
//!
//! ## What the engine does
//! - On the first tick, jumps the checkpoint to the chain head (no backfill).
//! - On later ticks, walks every block after the checkpoint up to the head, in order.
//! - Appends each transaction to the sender's and receiver's logs when they
//!   are subscribed, then advances the checkpoint for that block.
//! - Lets at most one tick run at a time and stops between blocks on shutdown.
//!
//! [`QueryService`] is the read side: current block, subscribe, transactions.
//!
//! ## Minimal usage
//! ```rust,ignore
//! use ethwatch::prelude::*;
//! use std::{sync::Arc, time::Duration};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let chain = EthClient::new(HttpTransport::new("http://127.0.0.1:8545", Duration::from_secs(30))?);
//!
//!     let query = QueryService::new(store.clone());
//!     query.subscribe("0x00000000219ab540356cbb839cbe05303d7705fa").await?;
//!
//!     let ingestor = Ingestor::new(store, chain);
//!     ingestor.run(Duration::from_secs(5)).await;
//!     Ok(())
//! }
//! ```

/// Ingestion loop: checkpoint-to-head catch-up with single-flight ticks.
pub mod engine;

/// Chain adapter: typed head and block lookups.
pub mod chain;

/// JSON-RPC envelope and transports.
pub mod rpc;

/// Storage trait and the in-memory implementation.
pub mod store;

/// Read-side facade.
pub mod query;

/// Addresses, quantities, transactions and blocks.
pub mod types;

/// Error taxonomy.
pub mod error;

/// Process configuration.
pub mod config;

/// HTTP API routes.
#[cfg(feature = "http-api")]
pub mod api;

// Public re-exports
pub use chain::{ChainSource, EthClient};
pub use config::Config;
pub use engine::{Ingestor, TickOutcome};
pub use error::{IndexerError, Result};
pub use query::QueryService;
#[cfg(feature = "http-client")]
pub use rpc::HttpTransport;
pub use rpc::{RpcCall, RpcTransport};
pub use store::{MemoryStore, TransactionStore};
pub use types::{Address, Block, Quantity, Transaction};

/// Convenience prelude for end users.
pub mod prelude {
    #[cfg(feature = "http-client")]
    pub use crate::HttpTransport;
    pub use crate::{
        Address, ChainSource, EthClient, Ingestor, MemoryStore, QueryService, TickOutcome,
        TransactionStore,
    };
}
