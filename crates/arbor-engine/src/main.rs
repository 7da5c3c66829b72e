//! Engine binary for Arbor.
//!
//! Runs a small world of behavior-tree agents split into zones, with the
//! remote debugger attached. Point a debugger client at `/ws/debug` to
//! pick a zone, pause and step it, and edit agent trees live.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `arbor-config.yaml` (defaults when absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the node registry and validate the configured trees
//! 4. Spawn zones and agents
//! 5. Start the debugger server and register the zones with it
//! 6. Run the simulation loop until `Ctrl-C` or the tick limit
//! 7. Log the result

mod aggro_callback;
mod error;
mod spawner;

use std::path::Path;
use std::sync::Arc;

use arbor_core::{ArborConfig, DebugServer, RunControl, Transport, run_simulation};
use arbor_observer::{AppState, ClientHub, spawn_observer};
use arbor_tree::AiRegistry;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::aggro_callback::AggroCallback;
use crate::error::EngineError;

const CONFIG_PATH: &str = "arbor-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself
/// fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration. Logging is not up yet, so remember whether
    //    the file was found and report it afterwards.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config);
    info!("arbor-engine starting");
    if !from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        max_ticks = config.world.max_ticks,
        zones = config.zones.len(),
        "Configuration loaded"
    );

    // 3. Registry and validation.
    let registry = AiRegistry::with_builtins();
    config.validate(&registry)?;

    // 4. Zones and agents.
    let zones = spawner::spawn_zones(&config, &registry)?;

    // 5. Debugger server.
    let hub = Arc::new(ClientHub::new(config.server.broadcast_capacity));
    let transport: Arc<dyn Transport> = Arc::clone(&hub) as Arc<dyn Transport>;
    let server = Arc::new(DebugServer::new(registry, transport));
    let app_state = Arc::new(AppState::new(Arc::clone(&server), hub));
    let (addr, observer_handle) = spawn_observer(&config.server, app_state).await?;
    info!(%addr, "Debugger listening on ws://{addr}/ws/debug");

    for zone in &zones {
        server.register_zone(Arc::clone(zone));
    }

    // 6. Run until stopped.
    let control = Arc::new(RunControl::new(
        config.world.tick_interval_ms,
        config.world.max_ticks,
    ));
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }

    let mut callback = AggroCallback::new(config.world.seed);
    let result = run_simulation(&zones, &server, &control, &mut callback).await?;

    // 7. Shut down.
    observer_handle.abort();
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "arbor-engine shutdown complete"
    );

    Ok(())
}

/// Load `arbor-config.yaml` from the working directory, or the defaults.
///
/// Returns the config and whether it came from the file.
fn load_config() -> Result<(ArborConfig, bool), EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok((ArborConfig::from_file(path)?, true))
    } else {
        let mut config = ArborConfig::default();
        config.server.apply_env_overrides();
        Ok((config, false))
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(config: &ArborConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
