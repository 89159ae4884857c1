//! Storage interface shared by the ingestion engine (single writer) and the
//! query facade (many readers), plus the in-memory implementation.
use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{Address, Quantity, Transaction},
};

/// Subscriptions, the ingestion checkpoint and per-address transaction logs.
///
/// Every method must be safe under concurrent invocation, and a reader must
/// never observe a partially appended entry. Implementations must not hold a
/// lock across I/O.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Block number through which ingestion has completed. Zero means "never ran".
    async fn checkpoint(&self) -> Result<Quantity>;

    /// Overwrite the checkpoint. No ordering check: callers keep it monotonic.
    async fn set_checkpoint(&self, number: Quantity) -> Result<()>;

    /// Mark `address` as watched. Idempotent; returns whether it was newly added.
    async fn subscribe(&self, address: Address) -> Result<bool>;

    /// Whether `address` is watched.
    async fn is_subscribed(&self, address: &Address) -> Result<bool>;

    /// All watched addresses.
    async fn subscribed(&self) -> Result<BTreeSet<Address>>;

    /// Append `tx` to the log of `address` if, and only if, it is watched right now.
    /// Returns whether the entry was stored.
    async fn append(&self, address: &Address, tx: &Transaction) -> Result<bool>;

    /// Log of `address` in append order. Empty for unknown addresses.
    async fn transactions_for(&self, address: &Address) -> Result<Vec<Transaction>>;

    /// Fan every transaction of block `number` out to its sender and receiver,
    /// then advance the checkpoint to `number`.
    ///
    /// Returns how many log entries were stored. The default goes through
    /// [`append`](Self::append) and [`set_checkpoint`](Self::set_checkpoint);
    /// implementations may override it to apply the block in one critical section.
    async fn apply_block(&self, number: &Quantity, transactions: &[Transaction]) -> Result<usize> {
        let mut stored = 0;
        for tx in transactions {
            if self.append(&tx.from, tx).await? {
                stored += 1;
            }
            if let Some(to) = &tx.to {
                if self.append(to, tx).await? {
                    stored += 1;
                }
            }
        }
        self.set_checkpoint(number.clone()).await?;
        Ok(stored)
    }
}

// concrete stores live here
pub mod memory;
pub use memory::MemoryStore;
