use anyhow::Result;
use progeny_core::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::AppState;

pub async fn run_server(addr: SocketAddr, config: Config) -> Result<()> {
    // Model loading is blocking work
    let state = tokio::task::spawn_blocking(move || AppState::from_config(&config)).await??;
    let state = Arc::new(state);

    tracing::info!(
        "Models loaded: {:?} (from {:?})",
        state.registry.loaded_crops(),
        state.models_directory
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::routes(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Starting daemon on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
