use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cineloop_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, Cache},
    services::{CatalogProvider, OpenAiRecommender, Recommender, TmdbProvider},
    storage::create_storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cineloop_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage")?;

    let (cache, cache_handle) = match &config.redis_url {
        Some(url) => {
            let (cache, handle) = Cache::new(create_redis_client(url)?);
            (Some(cache), Some(handle))
        }
        None => (None, None),
    };

    let mut state = AppState::new(storage.clone(), config.clone());

    if let Some(api_key) = config.tmdb_api_key.clone() {
        let catalog: Arc<dyn CatalogProvider> =
            Arc::new(TmdbProvider::new(&config, api_key, cache).await?);
        state = state.with_catalog(catalog);
    }

    if let Some(api_key) = config.openai_api_key.clone() {
        let recommender: Arc<dyn Recommender> = Arc::new(OpenAiRecommender::new(&config, api_key)?);
        state = state.with_recommender(recommender);
    }

    tracing::info!(
        env = %config.app_env,
        storage = storage.name(),
        catalog = state.catalog.is_some(),
        ai = state.recommender.is_some(),
        cache = cache_handle.is_some(),
        "Backends ready"
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    tracing::info!("Server running on http://{}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
