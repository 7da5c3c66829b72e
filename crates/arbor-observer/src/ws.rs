//! `WebSocket` endpoint speaking the debugger protocol.
//!
//! Clients connect to `GET /ws/debug`. Each text frame from the client is
//! a JSON [`ClientMessage`]; every command is answered with an `ack` (or
//! `pong`) on the same socket. Broadcasts from the tick thread arrive
//! through the hub's [`broadcast`](tokio::sync::broadcast) channel and
//! unicasts through the client's own queue.
//!
//! A client that falls behind on broadcasts skips ahead to the newest
//! message; the next tick re-sends the full picture anyway.

use std::sync::Arc;

use arbor_types::{ClientId, ClientMessage, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::commands;
use crate::state::AppState;

/// Upgrade an HTTP request to a debugger session.
///
/// # Route
///
/// `GET /ws/debug`
pub async fn ws_debug(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Run one client session until the socket closes, then detach the
/// client from the hub and the debug server.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let client = ClientId::new();
    let mut unicast = state.hub.register(client);
    let mut rx = state.hub.subscribe();
    state.server.on_client_connect(client);
    info!(%client, "debugger client connected");

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(json) => {
                        if socket.send(Message::Text(json.to_string().into())).await.is_err() {
                            debug!(%client, "send failed");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(%client, skipped = n, "client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!(%client, "broadcast channel closed");
                        break;
                    }
                }
            }
            Some(json) = unicast.recv() => {
                if socket.send(Message::Text(json.to_string().into())).await.is_err() {
                    debug!(%client, "send failed");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Some(reply) = handle_text(&state, client, text.as_str()) else {
                            continue;
                        };
                        if !send_json(&mut socket, &reply).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(%client, "WebSocket error: {e}");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.hub.unregister(client);
    state.server.on_client_disconnect(client);
    info!(%client, "debugger client disconnected");
}

/// Decode one text frame and dispatch it. Malformed frames are logged and
/// produce no reply.
fn handle_text(state: &AppState, client: ClientId, text: &str) -> Option<ServerMessage> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => {
            debug!(%client, ?message, "client command");
            Some(commands::dispatch(&state.server, message))
        }
        Err(e) => {
            warn!(%client, error = %e, "malformed client message");
            None
        }
    }
}

async fn send_json(socket: &mut WebSocket, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize reply: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}
