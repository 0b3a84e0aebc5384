use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use lets_vote::api;
use lets_vote::config::Config;
use lets_vote::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "Completion providers: {} (default), {} (online)",
        config.completion.default_base_url,
        config.completion.online_base_url
    );

    let state = AppState::new(config.clone())?;
    tracing::info!("Corpus loaded: {} chunks", state.store.chunk_count());

    let app = Router::new()
        .route("/api/candidates", get(api::candidates::list_candidates))
        .route("/api/candidates/{slug}", get(api::candidates::get_candidate))
        .route(
            "/api/candidates/{slug}/sources",
            get(api::candidates::candidate_sources),
        )
        .route(
            "/api/candidates/{slug}/issues/{issue}",
            get(api::candidates::candidate_issue),
        )
        .route("/api/search", post(api::search::search))
        .route("/api/chat", post(api::chat::chat))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
