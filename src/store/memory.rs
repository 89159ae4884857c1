//! Unbounded, process-local store behind a single reader/writer lock.
use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use tracing::debug;

use crate::{
    error::{IndexerError, Result},
    store::TransactionStore,
    types::{Address, Quantity, Transaction},
};

#[derive(Debug, Default)]
struct State {
    checkpoint: Quantity,
    subscribed: HashSet<Address>,
    logs: HashMap<Address, Vec<Transaction>>,
}

impl State {
    fn append(&mut self, address: &Address, tx: &Transaction) -> bool {
        if !self.subscribed.contains(address) {
            return false;
        }
        debug!(%address, from = %tx.from, value = %tx.value, "adding transaction");
        self.logs.entry(*address).or_default().push(tx.clone());
        true
    }
}

/// In-memory [`TransactionStore`].
///
/// One coarse lock guards all state; every operation is a single critical
/// section, so readers see whole entries only. Nothing is ever evicted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Empty store with checkpoint zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| IndexerError::Store("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| IndexerError::Store("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn checkpoint(&self) -> Result<Quantity> {
        Ok(self.read()?.checkpoint.clone())
    }

    async fn set_checkpoint(&self, number: Quantity) -> Result<()> {
        self.write()?.checkpoint = number;
        Ok(())
    }

    async fn subscribe(&self, address: Address) -> Result<bool> {
        Ok(self.write()?.subscribed.insert(address))
    }

    async fn is_subscribed(&self, address: &Address) -> Result<bool> {
        Ok(self.read()?.subscribed.contains(address))
    }

    async fn subscribed(&self) -> Result<BTreeSet<Address>> {
        Ok(self.read()?.subscribed.iter().copied().collect())
    }

    async fn append(&self, address: &Address, tx: &Transaction) -> Result<bool> {
        Ok(self.write()?.append(address, tx))
    }

    async fn transactions_for(&self, address: &Address) -> Result<Vec<Transaction>> {
        Ok(self.read()?.logs.get(address).cloned().unwrap_or_default())
    }

    async fn apply_block(&self, number: &Quantity, transactions: &[Transaction]) -> Result<usize> {
        let mut state = self.write()?;
        let mut stored = 0;
        for tx in transactions {
            stored += usize::from(state.append(&tx.from, tx));
            if let Some(to) = &tx.to {
                stored += usize::from(state.append(to, tx));
            }
        }
        state.checkpoint = number.clone();
        Ok(stored)
    }
}
