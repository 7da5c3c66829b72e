//! Axum router construction for the debugger transport.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/debug` -- `WebSocket` debugger session
/// - `GET /api/status` -- session summary
/// - `GET /api/zones` -- registered zones
/// - `GET /api/agents/{id}` -- one agent of the debugged zone
///
/// CORS allows any origin so browser-based debuggers can attach.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/debug", get(ws::ws_debug))
        .route("/api/status", get(handlers::get_status))
        .route("/api/zones", get(handlers::get_zones))
        .route("/api/agents/{id}", get(handlers::get_agent))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
