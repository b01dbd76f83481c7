//! Game state definitions and structures
//!
//! Owns the entity registry plus everything the frame step needs between
//! frames: simulation time, the respawn queue, spawner accumulators and the
//! random source.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SimulationConfig};
use crate::game::constants::powerup;
use crate::game::entity::{
    Color, Entity, EntityId, EntityTag, GameTime, GrenadePhase, PlayerId, PowerupKind,
};
use crate::game::registry::EntityRegistry;
use crate::game::systems::spawning::{self, SpawnAccumulators};
use crate::util::vec2::Vec2;

/// A player waiting to come back after being eaten
#[derive(Debug, Clone, PartialEq)]
pub struct RespawnEntry {
    pub player_id: PlayerId,
    pub color: Color,
    pub time_of_death: GameTime,
}

/// Orbiting power-up as seen by the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPowerup {
    pub kind: PowerupKind,
    pub position: Vec2,
    pub charges: u32,
}

/// Per-entity draw data, produced once per frame in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderObject {
    pub id: EntityId,
    pub tag: EntityTag,
    pub position: Vec2,
    pub radius: f32,
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aim_angle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powerup: Option<RenderPowerup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grenade_phase: Option<GrenadePhase>,
}

/// Complete game state
#[derive(Debug)]
pub struct GameState {
    pub registry: EntityRegistry,
    pub config: SimulationConfig,
    /// Simulation time of the last completed frame (seconds)
    pub time: GameTime,
    pub frame: u64,
    /// Ordered by time of death
    pub respawn_queue: VecDeque<RespawnEntry>,
    pub(crate) spawn: SpawnAccumulators,
    next_player_id: PlayerId,
    rng: StdRng,
}

impl GameState {
    /// Build an empty world. Fails fast on invalid configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic world for tests and benchmarks
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulationConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = EntityRegistry::new(&config.world)?;
        Ok(Self {
            registry,
            config,
            time: 0.0,
            frame: 0,
            respawn_queue: VecDeque::new(),
            spawn: SpawnAccumulators::default(),
            next_player_id: 0,
            rng,
        })
    }

    /// Populate the world with the configured initial food
    pub fn spawn_initial(&mut self) -> usize {
        let count = self.config.food.initial;
        spawning::spawn_food(self, count)
    }

    /// Spawn a new player at a random position. Returns its logical id.
    pub fn add_player(&mut self) -> PlayerId {
        let player_id = self.next_player_id;
        self.next_player_id += 1;
        let color = crate::game::entity::random_bright_color(&mut self.rng);
        spawning::spawn_player(self, player_id, color);
        tracing::info!("Player {} joined", player_id);
        player_id
    }

    #[inline]
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn player_entity(&self, player_id: PlayerId) -> Option<&Entity> {
        self.registry.player_entity(player_id)
    }

    pub fn alive_player_count(&self) -> usize {
        self.registry.count(EntityTag::Player)
    }

    /// Whether `player_id` is waiting in the respawn queue
    pub fn is_respawning(&self, player_id: PlayerId) -> bool {
        self.respawn_queue.iter().any(|e| e.player_id == player_id)
    }

    /// Draw data for every entity in insertion order
    pub fn snapshot(&self) -> Vec<RenderObject> {
        let timing = &self.config.grenade;
        self.registry
            .objects()
            .map(|e| {
                let player = e.as_player();
                RenderObject {
                    id: e.id(),
                    tag: e.tag(),
                    position: e.position,
                    radius: e.radius,
                    color: e.color,
                    player_id: player.map(|p| p.player_id),
                    aim_angle: player.map(|p| p.aim_angle),
                    powerup: player.and_then(|p| {
                        p.powerups.active().map(|active| RenderPowerup {
                            kind: active.kind,
                            position: orbit_position(e, active.orbit_angle),
                            charges: active.charges,
                        })
                    }),
                    grenade_phase: e.as_grenade().map(|g| g.phase(self.time, timing)),
                }
            })
            .collect()
    }
}

/// Where the active power-up of `owner` is drawn for a given orbit angle
pub fn orbit_position(owner: &Entity, orbit_angle: f32) -> Vec2 {
    let distance = owner.radius + powerup::ORBIT_GAP + powerup::RADIUS;
    owner.position + Vec2::from_angle(orbit_angle) * distance
}
