//! HTTP routes over [`QueryService`].
//!
//! Every failure is a `500` carrying the error message.
use std::collections::BTreeSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    error::IndexerError,
    query::QueryService,
    store::TransactionStore,
    types::{Address, Transaction},
};

/// Body of `GET /api/v1/current-block`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentBlock {
    /// Last ingested block number.
    pub number: u64,
}

/// Error wrapper turning [`IndexerError`] into a `500` response.
#[derive(Debug)]
pub struct ApiError(IndexerError);

impl From<IndexerError> for ApiError {
    fn from(e: IndexerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

/// Build the `/api/v1` router.
pub fn router<S: TransactionStore + 'static>(svc: QueryService<S>) -> Router {
    Router::new()
        .route("/api/v1/current-block", get(current_block::<S>))
        .route("/api/v1/subscriptions", get(subscriptions::<S>))
        .route("/api/v1/:address/transactions", get(transactions::<S>))
        .route("/api/v1/:address/subscribe", post(subscribe::<S>))
        .with_state(svc)
}

/// Serve the router on `listener` until `shutdown` fires.
pub async fn serve<S: TransactionStore + 'static>(
    listener: TcpListener,
    svc: QueryService<S>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "starting http server");
    axum::serve(listener, router(svc))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("http server stopped");
    Ok(())
}

async fn current_block<S: TransactionStore>(
    State(svc): State<QueryService<S>>,
) -> Result<Json<CurrentBlock>, ApiError> {
    let number = svc.current_block().await?;
    Ok(Json(CurrentBlock { number }))
}

async fn transactions<S: TransactionStore>(
    State(svc): State<QueryService<S>>,
    Path(address): Path<String>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    Ok(Json(svc.transactions(&address).await?))
}

async fn subscribe<S: TransactionStore>(
    State(svc): State<QueryService<S>>,
    Path(address): Path<String>,
) -> Result<StatusCode, ApiError> {
    svc.subscribe(&address).await?;
    Ok(StatusCode::OK)
}

async fn subscriptions<S: TransactionStore>(
    State(svc): State<QueryService<S>>,
) -> Result<Json<BTreeSet<Address>>, ApiError> {
    Ok(Json(svc.subscriptions().await?))
}
