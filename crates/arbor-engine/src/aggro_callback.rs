//! Tick callback that keeps the demo world eventful.
//!
//! Every tick, each zone has a chance that one of its agents takes a hit
//! from another, raising aggro against the attacker. Conditions such as
//! `HasEnemies` then have something to react to, and the debugger's
//! aggro panel has something to show.

use std::sync::Arc;

use arbor_core::{DebugServer, TickCallback, TickSummary};
use arbor_zone::Zone;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Chance per zone per tick that a hit lands.
const HIT_CHANCE: f64 = 0.05;

/// Aggro gained per hit.
const HIT_AGGRO: f32 = 10.0;

/// Ticks between progress log lines.
const LOG_EVERY: u64 = 100;

/// Stirs up aggro between agents of the same zone.
#[derive(Debug)]
pub struct AggroCallback {
    rng: StdRng,
}

impl AggroCallback {
    /// Create a callback with its own seeded generator.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn stir(&mut self, zone: &Zone) {
        if !self.rng.random_bool(HIT_CHANCE) {
            return;
        }
        let ids = zone.agent_ids();
        let (Some(&victim), Some(&attacker)) = (ids.choose(&mut self.rng), ids.choose(&mut self.rng))
        else {
            return;
        };
        if victim == attacker {
            return;
        }
        if let Some(handle) = zone.get_ai(victim) {
            let aggro = handle.lock().aggro_mut().add(attacker, HIT_AGGRO);
            debug!(zone = zone.name(), %victim, %attacker, aggro, "hit landed");
        }
    }
}

impl TickCallback for AggroCallback {
    fn on_tick(&mut self, summary: &TickSummary, zones: &[Arc<Zone>], server: &DebugServer) {
        for zone in zones {
            self.stir(zone);
        }
        if summary.tick % LOG_EVERY == 0 {
            let session = server.summary();
            debug!(
                tick = summary.tick,
                state = ?session.state,
                clients = session.clients,
                paused = session.paused,
                "Simulation progress"
            );
        }
    }
}
