//! Axum router setup for the Vizual server

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use crate::{
    ServerState,
    handlers::{get_graph, get_state, health_check},
    websocket::ws_handler,
};

/// Create the axum router with all routes
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Renderer boundary
        .route("/ws", get(ws_handler))
        // Snapshots
        .route("/api/graph", get(get_graph))
        .route("/api/state", get(get_state))
        .route("/api/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
