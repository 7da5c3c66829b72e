//! Populates the configured zones with agents.
//!
//! Character ids are unique across all zones, starting at 1 in
//! configuration order. Positions and per-agent seeds derive from the
//! world seed, so the same config always yields the same world.

use std::sync::Arc;

use arbor_core::{ArborConfig, ConfigError};
use arbor_tree::AiRegistry;
use arbor_types::{Character, CharacterId, Vec3};
use arbor_zone::{Agent, AggroTable, Zone};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::EngineError;

/// Half the side length of the square agents are scattered over.
const SPREAD: f32 = 50.0;

/// Create every configured zone with its agents.
pub fn spawn_zones(
    config: &ArborConfig,
    registry: &AiRegistry,
) -> Result<Vec<Arc<Zone>>, EngineError> {
    let mut rng = StdRng::seed_from_u64(config.world.seed);
    let mut next_id: u32 = 1;
    let mut zones = Vec::with_capacity(config.zones.len());

    for zone_config in &config.zones {
        let behaviour =
            zone_config
                .behaviour
                .build(registry)
                .map_err(|source| ConfigError::Behaviour {
                    zone: zone_config.name.clone(),
                    source,
                })?;

        let zone = Zone::new(zone_config.name.as_str());
        for _ in 0..zone_config.agents {
            let id = CharacterId::new(next_id);
            next_id = next_id.checked_add(1).ok_or_else(|| EngineError::Spawner {
                message: String::from("character id space exhausted"),
            })?;

            let position = Vec3::new(
                rng.random_range(-SPREAD..SPREAD),
                0.0,
                rng.random_range(-SPREAD..SPREAD),
            );
            let mut character = Character::new(id, position);
            character.orientation = rng.random_range(0.0..std::f32::consts::TAU);
            character
                .attributes
                .insert(String::from("zone"), zone_config.name.clone());

            let agent = Agent::new(character, behaviour.clone(), config.world.seed ^ u64::from(id.get()))
                .with_aggro(AggroTable::with_decay(zone_config.aggro_decay_per_second));
            zone.add_agent(agent)?;
        }

        info!(
            zone = zone.name(),
            agents = zone.len(),
            nodes = behaviour.len(),
            "Zone spawned"
        );
        zones.push(Arc::new(zone));
    }

    Ok(zones)
}
