//! REST endpoint handlers.
//!
//! Status reads come from the [`SessionSummary`](arbor_core::SessionSummary)
//! the debug server publishes after each tick, so they never contend with
//! the tick thread for the session lock.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/status` | Session summary |
//! | `GET` | `/api/zones` | Registered zones and the one under debug |
//! | `GET` | `/api/agents/:id` | Tree and live state of an agent in the debugged zone |

use std::sync::Arc;

use arbor_core::{SessionSummary, broadcast};
use arbor_types::{CharacterId, ServerMessage};
use axum::Json;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use serde::Serialize;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the session status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = state.server.summary();
    let zone = summary.zone.as_deref().unwrap_or("none");
    let selected = summary
        .selected
        .map_or_else(|| String::from("none"), |id| id.to_string());

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Arbor Debugger</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
        }}
        h1 {{ color: #58a6ff; }}
        a {{ color: #58a6ff; }}
        td {{ padding: 0.2rem 1rem 0.2rem 0; }}
    </style>
</head>
<body>
    <h1>Arbor Debugger</h1>
    <table>
        <tr><td>State</td><td>{state:?}</td></tr>
        <tr><td>Zone</td><td>{zone}</td></tr>
        <tr><td>Selected</td><td>{selected}</td></tr>
        <tr><td>Paused</td><td>{paused}</td></tr>
        <tr><td>Clients</td><td>{clients}</td></tr>
        <tr><td>Clock</td><td>{time} ms</td></tr>
        <tr><td>Zones</td><td>{zones}</td></tr>
    </table>
    <p>
        <a href="/api/status">/api/status</a> |
        <a href="/api/zones">/api/zones</a> |
        <code>/ws/debug</code>
    </p>
</body>
</html>"#,
        state = summary.state,
        paused = summary.paused,
        clients = summary.clients,
        time = summary.time_millis,
        zones = summary.zones.join(", "),
    ))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Return the latest published session summary.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = state.server.summary();
    Json(SessionSummary::clone(&summary))
}

// ---------------------------------------------------------------------------
// GET /api/zones
// ---------------------------------------------------------------------------

/// Response body for `GET /api/zones`.
#[derive(Debug, Serialize)]
pub struct ZonesResponse {
    /// Registered zone names, in registration order.
    pub zones: Vec<String>,
    /// Name of the zone under debug.
    pub active: Option<String>,
}

/// List the registered zones.
pub async fn get_zones(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = state.server.summary();
    Json(ZonesResponse {
        zones: summary.zones.clone(),
        active: summary.zone.clone(),
    })
}

// ---------------------------------------------------------------------------
// GET /api/agents/:id
// ---------------------------------------------------------------------------

/// Response body for `GET /api/agents/:id`.
#[derive(Debug, Serialize)]
pub struct AgentResponse {
    /// Static tree structure.
    pub tree: ServerMessage,
    /// Live execution details.
    pub details: ServerMessage,
}

/// Inspect one agent of the zone under debug without selecting it.
pub async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<impl IntoResponse, ObserverError> {
    let zone = state
        .server
        .active_zone()
        .ok_or(ObserverError::NoActiveZone)?;
    let character_id = CharacterId::new(id);
    let response = zone
        .execute_on(character_id, |agent| AgentResponse {
            tree: broadcast::character_static(agent),
            details: broadcast::character_details(agent),
        })
        .ok_or_else(|| {
            ObserverError::NotFound(format!("agent {character_id} in zone {}", zone.name()))
        })?;
    Ok(Json(response))
}
