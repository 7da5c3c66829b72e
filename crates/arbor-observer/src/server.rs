//! HTTP server lifecycle.
//!
//! [`start_server`] binds and serves in the current task;
//! [`spawn_observer`] binds eagerly and serves on a background task so
//! the engine can run its tick loop alongside.

use std::net::SocketAddr;
use std::sync::Arc;

use arbor_core::config::ServerConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::router::build_router;
use crate::state::AppState;

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

async fn bind(config: &ServerConfig) -> Result<(TcpListener, SocketAddr), ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    // Port 0 binds an ephemeral port; report the real one.
    let local = listener.local_addr().unwrap_or(addr);
    Ok((listener, local))
}

async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))
}

/// Bind to the configured address and serve until the process exits.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind or the server
/// encounters a fatal I/O error.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let (listener, addr) = bind(config).await?;
    info!(%addr, "debugger server listening");
    serve(listener, state).await
}

/// Bind to the configured address, then serve on a background task.
///
/// Returns the bound address and the task handle. The caller should abort
/// or await the handle during shutdown.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or taken.
/// Binding happens before the task is spawned, so this is detected
/// eagerly.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
    let (listener, addr) = bind(config).await?;
    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, state).await {
            error!(error = %e, "debugger server exited with error");
        }
    });
    info!(%addr, "debugger server spawned on background task");
    Ok((addr, handle))
}
