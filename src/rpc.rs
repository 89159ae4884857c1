//! JSON-RPC 2.0 envelope and the transport that carries it.
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{IndexerError, Result},
    types::Quantity,
};

/// The RPC calls the indexer makes, each carrying its own typed parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RpcCall {
    /// `eth_blockNumber`
    BlockNumber,
    /// `eth_getBlockByNumber`
    GetBlockByNumber {
        /// Height to fetch.
        number: Quantity,
        /// Return full transaction objects instead of hashes.
        full_transactions: bool,
    },
}

impl RpcCall {
    /// Method name on the wire.
    pub fn method(&self) -> &'static str {
        match self {
            RpcCall::BlockNumber => "eth_blockNumber",
            RpcCall::GetBlockByNumber { .. } => "eth_getBlockByNumber",
        }
    }

    /// Positional parameters on the wire.
    pub fn params(&self) -> Value {
        match self {
            RpcCall::BlockNumber => json!([]),
            RpcCall::GetBlockByNumber {
                number,
                full_transactions,
            } => json!([number, full_transactions]),
        }
    }
}

/// Request envelope.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Method name.
    pub method: &'a str,
    /// Positional parameters.
    pub params: Value,
    /// Correlation id.
    pub id: u64,
}

impl<'a> RpcRequest<'a> {
    /// Build the envelope for `call` with correlation id `id`.
    pub fn new(call: &'a RpcCall, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: call.method(),
            params: call.params(),
            id,
        }
    }
}

/// Error object inside a response.
#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    /// Error code.
    pub code: i64,
    /// Human readable message.
    pub message: String,
}

/// Response envelope; `result` stays opaque until the caller decodes it per method.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    /// Correlation id echoed by the node.
    #[serde(default)]
    pub id: Option<u64>,
    /// Protocol version.
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Method result.
    #[serde(default)]
    pub result: Option<Value>,
    /// Error object, when the call failed.
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Check the correlation id and unwrap the result.
    ///
    /// A missing `result` is returned as `Value::Null`.
    pub fn into_result(self, expected_id: u64) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(IndexerError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        match self.id {
            Some(id) if id != expected_id => Err(IndexerError::Decode(format!(
                "response id {id} does not match request id {expected_id}"
            ))),
            _ => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Carries one JSON-RPC call to the node and returns the raw `result`.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Perform `call`. Decoding the result is left to the caller.
    async fn call(&self, call: &RpcCall) -> Result<Value>;
}

/// Monotonic request id source.
#[derive(Debug, Default)]
pub struct RequestIds(AtomicU64);

impl RequestIds {
    /// Next id, starting at 1.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(feature = "http-client")]
pub use http::HttpTransport;

#[cfg(feature = "http-client")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;
    use tracing::trace;

    use super::{RequestIds, RpcCall, RpcRequest, RpcResponse, RpcTransport};
    use crate::error::{IndexerError, Result};

    /// JSON-RPC over HTTP POST.
    #[derive(Debug)]
    pub struct HttpTransport {
        client: reqwest::Client,
        url: String,
        ids: RequestIds,
    }

    impl HttpTransport {
        /// Transport posting to `url` with a per-request `timeout`.
        pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| IndexerError::Fetch(format!("build http client: {e}")))?;
            Ok(Self {
                client,
                url: url.into(),
                ids: RequestIds::default(),
            })
        }
    }

    #[async_trait]
    impl RpcTransport for HttpTransport {
        async fn call(&self, call: &RpcCall) -> Result<Value> {
            let id = self.ids.next();
            let req = RpcRequest::new(call, id);
            trace!(method = req.method, id, "rpc request");

            let resp = self
                .client
                .post(&self.url)
                .json(&req)
                .send()
                .await
                .map_err(|e| IndexerError::Fetch(format!("request to {}: {e}", self.url)))?;
            let resp = resp
                .error_for_status()
                .map_err(|e| IndexerError::Fetch(format!("request to {}: {e}", self.url)))?;
            let body = resp
                .bytes()
                .await
                .map_err(|e| IndexerError::Fetch(format!("read response body: {e}")))?;

            let envelope: RpcResponse = serde_json::from_slice(&body)?;
            envelope.into_result(id)
        }
    }
}
