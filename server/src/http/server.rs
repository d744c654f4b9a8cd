use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::{handlers, leads, state::AppState};

/// Inline base64 images travel through `POST /data`, so bodies can be large.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Content reads and writes
        .route("/data", get(handlers::get_data).post(handlers::post_data))
        .route("/upload", post(handlers::upload_file))
        // Lead capture
        .route("/leads/:form", post(leads::submit_lead))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn start_server(state: Arc<AppState>, bind_address: SocketAddr) -> Result<()> {
    let app = build_router(state);

    info!("Server listening on {}", bind_address);

    // Run the server
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
