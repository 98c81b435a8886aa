// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::coordinator::Coordinator;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) coordinator: Arc<Coordinator>,
    pub(crate) ws_fleet_connections: Arc<AtomicUsize>,
    pub(crate) config: AppConfig,
}

pub fn app(
    coordinator: Arc<Coordinator>,
    ws_fleet_connections: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        coordinator,
        ws_fleet_connections,
        config,
    };
    Router::new()
        .route("/", get(|| async { "minerdash fleet service" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/fleet", get(http::fleet_handler)) // GET /api/fleet
        .route("/api/refresh", post(http::refresh_handler)) // POST /api/refresh
        .route(
            "/api/ranges",
            get(http::ranges_handler).post(http::add_range_handler),
        ) // GET, POST /api/ranges
        .route("/api/ranges/reset", post(http::reset_ranges_handler)) // POST /api/ranges/reset
        .route("/api/ranges/{label}", delete(http::delete_range_handler)) // DELETE /api/ranges/{label}
        .route("/ws/fleet", get(ws::ws_fleet)) // WS /ws/fleet
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
