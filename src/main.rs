use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinematch_api::{
    api::{create_router, AppState},
    config::Config,
    db::CatalogStore,
    services::{providers::TmdbClient, PosterCache, PosterCacheConfig, RecommendationEngine},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinematch_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::debug!(config = ?config, "Configuration loaded");

    // Refuse to serve anything from a missing or inconsistent catalog
    let store = CatalogStore::load(&config.catalog_path, &config.similarity_path)
        .context("Failed to load movie catalog")?;

    let client = TmdbClient::new(
        config.movie_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.fetch_timeout(),
    )
    .context("Failed to build TMDB client")?;

    let posters = PosterCache::new(Arc::new(client), PosterCacheConfig::from(&config));
    let engine = RecommendationEngine::new(
        Arc::new(store),
        Arc::new(posters),
        config.self_exclusion,
    );

    let app = create_router(AppState::new(engine));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
