//! Simulation loop runner.
//!
//! [`run_simulation`] ticks every zone, then lets the [`DebugServer`]
//! apply queued debugger commands and broadcast, then notifies a
//! [`TickCallback`] and sleeps for the tick interval. It stops when
//! [`RunControl::request_stop`] is called or after `max_ticks`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arbor_zone::Zone;
use tracing::info;

use crate::server::DebugServer;

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The tick interval does not fit the simulation clock.
    #[error("tick interval of {0} ms is out of range")]
    IntervalOutOfRange(u64),
}

/// Why the simulation loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// [`RunControl::request_stop`] was called.
    Stopped,
}

/// Result of the simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationResult {
    /// Why the loop ended.
    pub end_reason: SimulationEndReason,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// What a [`TickCallback`] learns about a finished tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// One-based number of the tick that just ran.
    pub tick: u64,
    /// Simulated milliseconds the tick covered.
    pub delta_millis: i64,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after the zones ticked and the debug server updated.
    fn on_tick(&mut self, summary: &TickSummary, zones: &[Arc<Zone>], server: &DebugServer);
}

/// A no-op tick callback.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _zones: &[Arc<Zone>], _server: &DebugServer) {}
}

/// Shared loop controls, adjustable while the loop runs.
#[derive(Debug)]
pub struct RunControl {
    stop_requested: AtomicBool,
    tick_interval_ms: AtomicU64,
    max_ticks: u64,
}

impl RunControl {
    /// Create controls. `max_ticks == 0` means unbounded.
    pub const fn new(tick_interval_ms: u64, max_ticks: u64) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            max_ticks,
        }
    }

    /// Ask the loop to stop before its next tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the tick interval. Takes effect on the next tick.
    pub fn set_tick_interval_ms(&self, ms: u64) {
        self.tick_interval_ms.store(ms, Ordering::Release);
    }

    /// Configured tick limit, `0` for none.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    const fn tick_limit_reached(&self, ticks: u64) -> bool {
        self.max_ticks > 0 && ticks >= self.max_ticks
    }
}

/// Run the simulation loop until stopped or out of ticks.
///
/// Each tick advances every zone by the tick interval, then runs
/// [`DebugServer::update`] with the same delta.
///
/// # Errors
///
/// Returns [`RunnerError::IntervalOutOfRange`] if the tick interval does
/// not fit in an `i64` of milliseconds.
pub async fn run_simulation(
    zones: &[Arc<Zone>],
    server: &DebugServer,
    control: &RunControl,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut total_ticks: u64 = 0;

    info!(
        zones = zones.len(),
        max_ticks = control.max_ticks(),
        tick_interval_ms = control.tick_interval_ms(),
        "Simulation starting"
    );

    loop {
        if control.is_stop_requested() {
            info!(total_ticks, "Stop requested");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::Stopped,
                total_ticks,
            });
        }

        let interval_ms = control.tick_interval_ms();
        let delta_millis =
            i64::try_from(interval_ms).map_err(|_| RunnerError::IntervalOutOfRange(interval_ms))?;

        for zone in zones {
            zone.update(delta_millis);
        }
        server.update(delta_millis);

        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(
            &TickSummary {
                tick: total_ticks,
                delta_millis,
            },
            zones,
            server,
        );

        if control.tick_limit_reached(total_ticks) {
            info!(total_ticks, "Tick limit reached");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::MaxTicksReached,
                total_ticks,
            });
        }

        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }
}
