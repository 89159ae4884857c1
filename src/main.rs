use std::sync::Arc;

use anyhow::Context;
use ethwatch::{api, Config, EthClient, HttpTransport, Ingestor, MemoryStore, QueryService};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, Instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        rpc_url = %config.rpc_url,
        listen_address = %config.listen_address,
        poll_interval_secs = config.poll_interval_secs,
        "loaded config"
    );

    let store = Arc::new(MemoryStore::new());
    let shutdown = CancellationToken::new();

    let transport = HttpTransport::new(config.rpc_url.clone(), config.rpc_timeout())?;
    let ingestor = Ingestor::new(store.clone(), EthClient::new(transport))
        .with_cancellation(shutdown.clone());
    let every = config.poll_interval();
    let worker = tokio::spawn(
        async move { ingestor.run(every).await }.instrument(tracing::info_span!("ingest")),
    );

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    let server = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let res = api::serve(listener, QueryService::new(store), shutdown.clone()).await;
            // a dead server takes the worker down with it
            shutdown.cancel();
            res
        })
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("listen for ctrl-c")?;
            info!("shutdown requested");
        }
        _ = shutdown.cancelled() => {}
    }
    shutdown.cancel();

    worker.await.context("ingestion task panicked")?;
    server
        .await
        .context("http task panicked")?
        .context("http server")?;
    Ok(())
}
