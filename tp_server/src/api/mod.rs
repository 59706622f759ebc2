//! HTTP/WebSocket API for the game server.
//!
//! The transport is deliberately thin: it parses inbound frames, routes
//! them to the room registry, and pumps outbound events back to each
//! connection. All game semantics live in the `teen_patti` library.
//!
//! # Endpoints
//!
//! - `GET /ws` - Establish the WebSocket connection
//! - `GET /health` - Server health status

pub mod websocket;

use std::sync::Arc;

use axum::{Router, response::Json, routing::get};
use serde_json::json;
use teen_patti::RoomManager;
use tower_http::cors::CorsLayer;

/// Application state shared across all handlers and connections.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomManager>,
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
