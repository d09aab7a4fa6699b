pub mod config;
pub mod dispatch;
pub mod error;
pub mod leaderboard;
pub mod registry;
pub mod routes;
pub mod state;
pub mod ws;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build a fully configured Router + shared state.
pub fn build_app(config: ServerConfig) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config));

    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/leaderboard", get(routes::leaderboard))
        .route("/ws", get(routes::ws_upgrade))
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    (app, state)
}
