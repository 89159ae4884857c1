use async_trait::async_trait;
use ethwatch::store::{MemoryStore, TransactionStore}; // bring trait methods into scope
use ethwatch::{Address, Quantity, Transaction};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn addr(b: u8) -> Address {
    Address::new([b; 20])
}

fn tx(from: u8, to: u8, value: u64) -> Transaction {
    Transaction {
        from: addr(from),
        to: Some(addr(to)),
        value: Quantity::from(value),
    }
}

#[tokio::test]
async fn fresh_store_defaults() -> anyhow::Result<()> {
    let store = MemoryStore::new();

    assert!(store.checkpoint().await?.is_zero(), "fresh store starts at the zero sentinel");
    assert!(store.subscribed().await?.is_empty());
    assert!(!store.is_subscribed(&addr(1)).await?);
    assert!(
        store.transactions_for(&addr(1)).await?.is_empty(),
        "unknown address reads as an empty log"
    );
    Ok(())
}

#[tokio::test]
async fn checkpoint_is_a_plain_overwrite() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    store.set_checkpoint(Quantity::from(123_456)).await?;
    assert_eq!(store.checkpoint().await?, Quantity::from(123_456));

    // no ordering check inside the store
    store.set_checkpoint(Quantity::from(7)).await?;
    assert_eq!(store.checkpoint().await?, Quantity::from(7));
    Ok(())
}

#[tokio::test]
async fn subscribe_twice_keeps_one_entry() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    assert!(store.subscribe(addr(1)).await?);
    assert!(!store.subscribe(addr(1)).await?);

    assert_eq!(store.subscribed().await?, BTreeSet::from([addr(1)]));

    store.append(&addr(1), &tx(1, 2, 3)).await?;
    assert_eq!(store.transactions_for(&addr(1)).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn append_is_filtered_by_subscription_at_append_time() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let early = tx(1, 2, 10);
    let late = tx(1, 2, 20);

    assert!(!store.append(&addr(2), &early).await?);
    store.subscribe(addr(2)).await?;
    assert!(store.append(&addr(2), &late).await?);

    // the earlier transfer is not backfilled
    assert_eq!(store.transactions_for(&addr(2)).await?, vec![late]);
    Ok(())
}

#[tokio::test]
async fn log_keeps_append_order() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    store.subscribe(addr(9)).await?;
    let txs: Vec<_> = (0..5).map(|v| tx(9, 8, v)).collect();
    for t in &txs {
        store.append(&addr(9), t).await?;
    }
    assert_eq!(store.transactions_for(&addr(9)).await?, txs);
    Ok(())
}

#[tokio::test]
async fn apply_block_fans_out_and_advances_checkpoint() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    store.subscribe(addr(1)).await?;
    store.subscribe(addr(2)).await?;

    let txs = vec![tx(1, 2, 1), tx(3, 1, 2), tx(3, 4, 3)];
    let stored = store.apply_block(&Quantity::from(42), &txs).await?;

    assert_eq!(stored, 3);
    assert_eq!(store.checkpoint().await?, Quantity::from(42));
    assert_eq!(store.transactions_for(&addr(1)).await?, vec![txs[0].clone(), txs[1].clone()]);
    assert_eq!(store.transactions_for(&addr(2)).await?, vec![txs[0].clone()]);
    assert!(store.transactions_for(&addr(4)).await?.is_empty());
    Ok(())
}

/// ------- Store relying on the trait's default `apply_block` -------
struct CountingStore {
    inner: MemoryStore,
    appends: AtomicUsize,
}

#[async_trait]
impl TransactionStore for CountingStore {
    async fn checkpoint(&self) -> ethwatch::Result<Quantity> {
        self.inner.checkpoint().await
    }
    async fn set_checkpoint(&self, number: Quantity) -> ethwatch::Result<()> {
        self.inner.set_checkpoint(number).await
    }
    async fn subscribe(&self, address: Address) -> ethwatch::Result<bool> {
        self.inner.subscribe(address).await
    }
    async fn is_subscribed(&self, address: &Address) -> ethwatch::Result<bool> {
        self.inner.is_subscribed(address).await
    }
    async fn subscribed(&self) -> ethwatch::Result<BTreeSet<Address>> {
        self.inner.subscribed().await
    }
    async fn append(&self, address: &Address, tx: &Transaction) -> ethwatch::Result<bool> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        self.inner.append(address, tx).await
    }
    async fn transactions_for(&self, address: &Address) -> ethwatch::Result<Vec<Transaction>> {
        self.inner.transactions_for(address).await
    }
}

#[tokio::test]
async fn default_apply_block_appends_once_per_side() -> anyhow::Result<()> {
    let store = CountingStore {
        inner: MemoryStore::new(),
        appends: AtomicUsize::new(0),
    };
    store.subscribe(addr(1)).await?;

    let creation = Transaction {
        from: addr(1),
        to: None,
        value: Quantity::zero(),
    };
    let stored = store
        .apply_block(&Quantity::from(5), &[tx(1, 2, 1), creation])
        .await?;

    // two sides for the transfer, one for the creation
    assert_eq!(store.appends.load(Ordering::SeqCst), 3);
    assert_eq!(stored, 2);
    assert_eq!(store.checkpoint().await?, Quantity::from(5));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_see_partial_blocks() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    store.subscribe(addr(1)).await?;

    // every block carries exactly two transfers touching addr(1)
    let writer = tokio::spawn({
        let store = store.clone();
        async move {
            for n in 1..=200u64 {
                let txs = vec![tx(1, 2, n), tx(3, 1, n)];
                store.apply_block(&Quantity::from(n), &txs).await?;
            }
            anyhow::Ok(())
        }
    });

    let mut readers = Vec::new();
    for _ in 0..4 {
        let store = store.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..200 {
                let log = store.transactions_for(&addr(1)).await?;
                assert_eq!(log.len() % 2, 0, "observed half a block");
                tokio::task::yield_now().await;
            }
            anyhow::Ok(())
        }));
    }

    writer.await??;
    for r in readers {
        r.await??;
    }
    assert_eq!(store.transactions_for(&addr(1)).await?.len(), 400);
    assert_eq!(store.checkpoint().await?, Quantity::from(200));
    Ok(())
}
