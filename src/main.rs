use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;

use catalog_feed_api::config::AppConfig;
use catalog_feed_api::database::store::CatalogStore;
use catalog_feed_api::handlers::catalog::AppState;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up API_KEY, DB_* and PORT
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();
    if config.api_key.is_empty() {
        tracing::warn!("API_KEY is empty; only callers sending an empty key will pass");
    }

    let store = CatalogStore::connect(&config.database)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.redacted_url()))?;

    let state = AppState {
        source: Arc::new(store.clone()),
        api_key: config.api_key.clone(),
    };
    let app = catalog_feed_api::app(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    // Serve until interrupted, then drain in-flight requests for at most
    // DRAIN_TIMEOUT before closing the pool.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future(),
    );

    signal::ctrl_c()
        .await
        .context("failed to listen for interrupt signal")?;
    tracing::info!("Shutting down the server");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server).await {
        Ok(joined) => joined.context("server task panicked")?.context("server error")?,
        Err(_) => tracing::warn!("graceful drain timed out after {DRAIN_TIMEOUT:?}"),
    }

    store.close().await;
    tracing::info!("Server gracefully stopped");
    Ok(())
}
