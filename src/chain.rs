//! Typed view over the node: current head and blocks by number.
use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::{IndexerError, Result},
    rpc::{RpcCall, RpcTransport},
    types::{Block, Quantity},
};

/// Source of chain data consumed by the ingestion engine.
///
/// No caching and no retries; each call is one round trip.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Most recently produced block number.
    async fn current_head(&self) -> Result<Quantity>;

    /// Block `number` with full transaction objects. The list may be empty.
    async fn block_by_number(&self, number: &Quantity) -> Result<Block>;
}

#[async_trait]
impl<T: ChainSource + ?Sized> ChainSource for std::sync::Arc<T> {
    async fn current_head(&self) -> Result<Quantity> {
        (**self).current_head().await
    }

    async fn block_by_number(&self, number: &Quantity) -> Result<Block> {
        (**self).block_by_number(number).await
    }
}

/// Ethereum JSON-RPC adapter over any [`RpcTransport`].
#[derive(Debug)]
pub struct EthClient<T> {
    transport: T,
}

impl<T: RpcTransport> EthClient<T> {
    /// Wrap a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: RpcTransport> ChainSource for EthClient<T> {
    async fn current_head(&self) -> Result<Quantity> {
        let raw = self.transport.call(&RpcCall::BlockNumber).await?;
        Ok(serde_json::from_value(raw)?)
    }

    async fn block_by_number(&self, number: &Quantity) -> Result<Block> {
        let raw = self
            .transport
            .call(&RpcCall::GetBlockByNumber {
                number: number.clone(),
                full_transactions: true,
            })
            .await?;
        if raw == Value::Null {
            return Err(IndexerError::BlockNotFound(number.clone()));
        }

        let block: Block = serde_json::from_value(raw)?;
        if &block.number != number {
            return Err(IndexerError::Decode(format!(
                "asked for block {number}, node returned {}",
                block.number
            )));
        }
        Ok(block)
    }
}
