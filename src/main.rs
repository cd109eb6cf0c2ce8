use std::sync::Arc;

use reelmatch::{
    config::Config,
    routes::{create_router, AppState},
    services::{providers::TmdbProvider, Recommender},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reelmatch=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let catalog = Arc::new(TmdbProvider::from_config(&config)?);
    let recommender = Recommender::from_config(&config);

    tracing::info!(
        corpus_limit = recommender.corpus_limit(),
        default_count = recommender.default_count(),
        stop_words = ?config.stop_words,
        "Recommender configured"
    );

    let state = Arc::new(AppState::new(catalog, recommender));
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
