//! Ingestion loop:
//! 1) read the checkpoint and the chain head,
//! 2) bootstrap straight to the head on first run,
//! 3) otherwise walk `checkpoint+1 ..= head` in order, fanning each block's
//!    transactions out to the store and advancing the checkpoint per block.
use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tokio::{
    sync::Mutex,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{chain::ChainSource, error::IndexerError, store::TransactionStore, types::Quantity};

/// What a single tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// First run: checkpoint jumped to the head without ingesting anything.
    Bootstrapped {
        /// Head the checkpoint was set to.
        head: Quantity,
    },
    /// Head was not ahead of the checkpoint.
    Idle {
        /// Unchanged checkpoint.
        checkpoint: Quantity,
    },
    /// Blocks `from ..= to` were ingested.
    CaughtUp {
        /// First block applied.
        from: Quantity,
        /// Last block applied; the checkpoint now equals this.
        to: Quantity,
        /// Log entries stored across the range.
        stored: usize,
    },
    /// Another tick was still in flight.
    Skipped,
    /// Shutdown was requested; progress up to `checkpoint` is kept.
    Cancelled {
        /// Checkpoint reached before stopping.
        checkpoint: Quantity,
    },
}

/// Polls a [`ChainSource`] and writes watched transactions into a [`TransactionStore`].
///
/// `S` = store shared with the query side, `C` = chain source.
pub struct Ingestor<S, C> {
    store: Arc<S>,
    chain: C,
    in_flight: Mutex<()>,
    cancel: CancellationToken,
}

impl<S, C> Ingestor<S, C>
where
    S: TransactionStore + 'static,
    C: ChainSource + 'static,
{
    /// Create an ingestor writing into `store` and reading from `chain`.
    pub fn new(store: Arc<S>, chain: C) -> Self {
        Self {
            store,
            chain,
            in_flight: Mutex::new(()),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token, e.g. one shared with the HTTP server.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Ask the loop to stop after the block it is currently applying.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Run one ingestion pass.
    ///
    /// At most one tick runs at a time; an overlapping call returns
    /// [`TickOutcome::Skipped`] without touching the chain.
    ///
    /// # Errors
    /// Returns an error if reading the checkpoint, fetching the head or a block,
    /// or writing to the store fails. Blocks applied before the failure stay
    /// applied and the checkpoint reflects them.
    pub async fn tick(&self) -> anyhow::Result<TickOutcome> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("previous tick still running, skipping");
            return Ok(TickOutcome::Skipped);
        };

        let checkpoint = self.store.checkpoint().await.context("read checkpoint")?;
        if self.cancel.is_cancelled() {
            return Ok(TickOutcome::Cancelled { checkpoint });
        }

        let head = self
            .chain
            .current_head()
            .await
            .context("fetch chain head")?;

        if checkpoint.is_zero() {
            info!(block_number = %head, "no checkpoint yet, starting from chain head");
            self.store
                .set_checkpoint(head.clone())
                .await
                .context("store bootstrap checkpoint")?;
            return Ok(TickOutcome::Bootstrapped { head });
        }

        if head <= checkpoint {
            debug!(%checkpoint, %head, "no new blocks");
            return Ok(TickOutcome::Idle { checkpoint });
        }

        let from = checkpoint.next();
        info!(
            num_blocks_to_process = head.saturating_sub(&checkpoint).low_u64(),
            from_block = %from,
            to_block = %head,
            "processing new blocks"
        );

        let mut stored = 0;
        let mut last = checkpoint;
        let mut n = from.clone();
        while n <= head {
            if self.cancel.is_cancelled() {
                info!(checkpoint = %last, "shutdown requested, stopping catch-up");
                return Ok(TickOutcome::Cancelled { checkpoint: last });
            }

            let block = self
                .chain
                .block_by_number(&n)
                .await
                .with_context(|| format!("fetch block {n}"))?;

            let appended = self
                .store
                .apply_block(&n, &block.transactions)
                .await
                .with_context(|| format!("apply block {n}"))?;
            stored += appended;

            info!(
                block_number = %n,
                num_transactions = block.transactions.len(),
                stored = appended,
                "processed block"
            );

            last = n.clone();
            n = n.next();
        }

        Ok(TickOutcome::CaughtUp {
            from,
            to: last,
            stored,
        })
    }

    /// Tick every `every` until the cancellation token fires.
    ///
    /// Tick failures are logged and retried on the next trigger; they never end the loop.
    pub async fn run(&self, every: Duration) {
        info!(interval_secs = every.as_secs(), "starting ingestion loop");

        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.tick().await {
                Ok(TickOutcome::Cancelled { .. }) => break,
                Ok(outcome) => debug!(?outcome, "tick finished"),
                Err(err) => {
                    let cause = format!("{err:#}");
                    let fetch = err
                        .downcast_ref::<IndexerError>()
                        .is_some_and(IndexerError::is_fetch);
                    error!(error = %cause, fetch, "ingestion tick failed");
                }
            }
        }

        info!("ingestion loop stopped");
    }
}
