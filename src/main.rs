use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use click_recs::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, EventStore, RedisEventStore},
    ingestion::{IngestionWorker, RedisListFeed},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("click_recs=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let redis_client = create_redis_client(&config.redis_url)?;
    let store: Arc<dyn EventStore> = Arc::new(RedisEventStore::new(
        redis_client.clone(),
        config.events_key.clone(),
    ));

    // The query path reads whatever the store holds; it never waits on this worker
    let ingestion = if config.ingestion_enabled {
        let feed = RedisListFeed::new(
            redis_client,
            config.feed_key.clone(),
            config.feed_poll_timeout(),
        );
        Some(IngestionWorker::spawn(
            feed,
            store.clone(),
            config.restart_policy(),
        ))
    } else {
        tracing::info!("Ingestion worker disabled");
        None
    };

    let state = AppState::new(store, config.query_defaults());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server running");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = ingestion {
        let stats = handle.shutdown().await;
        tracing::info!(?stats, "Ingestion stopped");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
