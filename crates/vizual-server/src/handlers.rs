//! REST API handlers for the Vizual server

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde::Serialize;

use crate::ServerState;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub node_count: usize,
    pub debugger_attached: bool,
}

/// Current graph, in the same shape as the `graph/update` message.
pub async fn get_graph(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(state.controller.graph_snapshot().await)
}

/// Current filters, colors, root and mode, as a `state/update` message.
pub async fn get_state(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(state.controller.state_snapshot().await)
}

pub async fn health_check(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let node_count = state.controller.store().read().await.node_count();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        node_count,
        debugger_attached: state.controller.is_debugger_attached(),
    })
}
