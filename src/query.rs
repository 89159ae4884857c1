//! Read-side facade used by the HTTP layer.
use std::{collections::BTreeSet, sync::Arc};

use tracing::{debug, info};

use crate::{
    error::Result,
    store::TransactionStore,
    types::{Address, Transaction},
};

/// Validates caller input and passes through to the store.
#[derive(Debug)]
pub struct QueryService<S> {
    store: Arc<S>,
}

impl<S> Clone for QueryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TransactionStore> QueryService<S> {
    /// Facade over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Last ingested block number, truncated to 64 bits.
    pub async fn current_block(&self) -> Result<u64> {
        Ok(self.store.checkpoint().await?.low_u64())
    }

    /// Start watching `address`.
    ///
    /// # Errors
    /// [`IndexerError::InvalidAddress`](crate::error::IndexerError::InvalidAddress)
    /// if `address` is not a `0x`-prefixed 40-digit hex string.
    pub async fn subscribe(&self, address: &str) -> Result<()> {
        let address: Address = address.parse()?;
        if self.store.subscribe(address).await? {
            info!(%address, "subscribed");
        }
        Ok(())
    }

    /// Transactions recorded for `address` since it was subscribed. Empty when none.
    ///
    /// # Errors
    /// [`IndexerError::InvalidAddress`](crate::error::IndexerError::InvalidAddress)
    /// on malformed input.
    pub async fn transactions(&self, address: &str) -> Result<Vec<Transaction>> {
        let address: Address = address.parse()?;
        debug!(%address, "get transactions");
        self.store.transactions_for(&address).await
    }

    /// Every watched address.
    pub async fn subscriptions(&self) -> Result<BTreeSet<Address>> {
        self.store.subscribed().await
    }
}
