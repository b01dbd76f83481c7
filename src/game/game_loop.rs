//! Frame orchestration
//!
//! [`step`] advances the world by one frame. Every registry and grid mutation
//! for a frame completes inside it, so the next frame's queries always see a
//! consistent index. [`GameLoop`] drives `step` on a fixed-rate tokio interval.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use smallvec::SmallVec;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::game::entity::{EntityId, GameTime, PlayerId, PowerupKind};
use crate::game::input_buffer::{InputBuffer, InputSender, IntentTable};
use crate::game::state::GameState;
use crate::game::systems::{consumption, gravity, physics, spawning, weapons};
use crate::metrics::Metrics;

/// Something that happened during a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    PlayerEaten {
        player_id: PlayerId,
        eaten_by: PlayerId,
    },
    PlayerRespawned {
        player_id: PlayerId,
        entity_id: EntityId,
    },
    PowerupCollected {
        player_id: PlayerId,
        kind: PowerupKind,
    },
    GrenadeFired {
        player_id: PlayerId,
        grenade_id: EntityId,
    },
    GrenadeExpired {
        grenade_id: EntityId,
    },
    Spawned {
        food: usize,
        powerups: usize,
    },
}

/// Advance the simulation by one frame ending at `now`.
///
/// Order: respawns and spawners, player intents (aim, thrust, fire), motion
/// integration, consumption, emitter gravity and grenade expiry.
pub fn step(state: &mut GameState, intents: &IntentTable, now: GameTime, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if dt.is_nan() || dt <= 0.0 {
        return events;
    }
    state.time = now;
    state.frame += 1;

    for (player_id, entity_id) in spawning::process_respawns(state, now) {
        events.push(GameEvent::PlayerRespawned {
            player_id,
            entity_id,
        });
    }

    let spawned = spawning::update(state, dt);
    if spawned.food > 0 || spawned.powerups > 0 {
        events.push(GameEvent::Spawned {
            food: spawned.food,
            powerups: spawned.powerups,
        });
    }

    apply_intents(state, intents, now, dt, &mut events);
    weapons::advance_orbits(state, dt);

    state.registry.advance(dt, state.config.physics.damping_rate);

    events.extend(consumption::resolve(state, now));

    gravity::apply_emitters(state, now, dt);
    events.extend(gravity::remove_expired(state, now));

    events
}

/// Turn, thrust and fire for every live player
fn apply_intents(state: &mut GameState, intents: &IntentTable, now: GameTime, dt: f32, events: &mut Vec<GameEvent>) {
    let players: SmallVec<[EntityId; 16]> = state.registry.player_ids().iter().copied().collect();

    for entity_id in players {
        let Some(player_id) = state
            .registry
            .get(entity_id)
            .and_then(|e| e.as_player())
            .map(|p| p.player_id)
        else {
            continue;
        };
        let intent = intents.get(player_id);

        state.registry.update(entity_id, |e| {
            physics::update_aim(e, intent.aim_dir, dt);
            physics::apply_thrust(e, intent.move_dir, dt);
        });

        if intent.fire {
            if let Some(event) = weapons::fire(state, entity_id, intent.is_aiming(), now) {
                events.push(event);
            }
        }
    }
}

/// Owns the state, the intent plumbing and the simulation clock
pub struct GameLoop {
    state: GameState,
    intents: IntentTable,
    input: InputBuffer,
    metrics: Arc<Metrics>,
    dt: f32,
}

impl GameLoop {
    pub fn new(state: GameState, metrics: Arc<Metrics>) -> Self {
        let dt = 1.0 / state.config.physics.tick_rate.max(1) as f32;
        Self {
            state,
            intents: IntentTable::new(),
            input: InputBuffer::default(),
            metrics,
            dt,
        }
    }

    /// Producer handle for intent sources
    pub fn sender(&self) -> InputSender {
        self.input.sender()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn into_state(self) -> GameState {
        self.state
    }

    pub fn intents(&self) -> &IntentTable {
        &self.intents
    }

    /// Fixed frame duration in seconds
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Run one frame: drain queued intents, step the world, record metrics
    pub fn tick(&mut self) -> Vec<GameEvent> {
        let start = Instant::now();

        self.input.drain_into(&mut self.intents);
        let now = self.state.time + self.dt as GameTime;
        let events = step(&mut self.state, &self.intents, now, self.dt);

        self.metrics.record_frame_time(start.elapsed());
        self.metrics.record_state(&self.state);
        self.metrics.record_events(&events);

        for event in &events {
            debug!("Frame {}: {:?}", self.state.frame, event);
        }
        events
    }

    /// Tick at the configured rate until `shutdown` resolves or `max_frames`
    /// frames have run. Returns the number of frames run.
    pub async fn run<F>(&mut self, max_frames: Option<u64>, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let tick_rate = self.state.config.physics.tick_rate.max(1);
        let mut ticker = interval(Duration::from_secs_f64(1.0 / tick_rate as f64));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!("Frame loop started at {} Hz", tick_rate);
        let mut frames: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Frame loop stopping after {} frames", frames);
                    break;
                }
                _ = ticker.tick() => {
                    self.tick();
                    frames += 1;

                    // Stats every 5 seconds of simulation
                    if frames % (tick_rate as u64 * 5) == 0 {
                        let snapshot = self.metrics.snapshot();
                        info!(
                            "Frame {}: {} entities ({} food), {} players alive, {} respawning | frame p95 {}us",
                            self.state.frame,
                            snapshot.entities.total,
                            snapshot.entities.food,
                            snapshot.entities.alive_players,
                            snapshot.entities.respawn_pending,
                            snapshot.performance.frame_time_p95_us
                        );
                    }

                    if max_frames.is_some_and(|max| frames >= max) {
                        info!("Frame limit of {} reached", frames);
                        break;
                    }
                }
            }
        }

        frames
    }
}
