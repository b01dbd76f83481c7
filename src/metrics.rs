//! Simulation metrics
//!
//! Lock-free counters updated by the frame loop plus a rolling window of
//! frame times for percentiles. Readable from any thread; exported as JSON.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;

use crate::game::entity::EntityTag;
use crate::game::game_loop::GameEvent;
use crate::game::state::GameState;

/// Frame times kept for percentile calculation
const FRAME_HISTORY: usize = 1000;

#[derive(Debug)]
pub struct Metrics {
    // Entity counts
    pub entity_count: AtomicU64,
    pub food_count: AtomicU64,
    pub alive_players: AtomicU64,
    pub respawn_pending: AtomicU64,
    pub grenade_count: AtomicU64,
    pub powerup_count: AtomicU64,

    // Event counters
    pub players_eaten: AtomicU64,
    pub respawns: AtomicU64,
    pub grenades_fired: AtomicU64,
    pub powerups_collected: AtomicU64,

    // Frame timing (microseconds)
    pub frame_count: AtomicU64,
    pub frame_time_us: AtomicU64,
    pub frame_time_p95_us: AtomicU64,
    pub frame_time_p99_us: AtomicU64,
    pub frame_time_max_us: AtomicU64,

    start_time: Instant,

    // VecDeque for O(1) pop_front
    frame_history: RwLock<VecDeque<u64>>,
}

/// Point-in-time copy of every metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub entities: EntityMetrics,
    pub events: EventMetrics,
    pub performance: PerformanceMetrics,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityMetrics {
    pub total: u64,
    pub food: u64,
    pub alive_players: u64,
    pub respawn_pending: u64,
    pub grenades: u64,
    pub powerups: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventMetrics {
    pub players_eaten: u64,
    pub respawns: u64,
    pub grenades_fired: u64,
    pub powerups_collected: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceMetrics {
    pub frame_count: u64,
    pub frame_time_us: u64,
    pub frame_time_p95_us: u64,
    pub frame_time_p99_us: u64,
    pub frame_time_max_us: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            entity_count: AtomicU64::new(0),
            food_count: AtomicU64::new(0),
            alive_players: AtomicU64::new(0),
            respawn_pending: AtomicU64::new(0),
            grenade_count: AtomicU64::new(0),
            powerup_count: AtomicU64::new(0),
            players_eaten: AtomicU64::new(0),
            respawns: AtomicU64::new(0),
            grenades_fired: AtomicU64::new(0),
            powerups_collected: AtomicU64::new(0),
            frame_count: AtomicU64::new(0),
            frame_time_us: AtomicU64::new(0),
            frame_time_p95_us: AtomicU64::new(0),
            frame_time_p99_us: AtomicU64::new(0),
            frame_time_max_us: AtomicU64::new(0),
            start_time: Instant::now(),
            frame_history: RwLock::new(VecDeque::with_capacity(FRAME_HISTORY)),
        }
    }

    /// Record a frame time and update percentiles
    pub fn record_frame_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.frame_time_us.store(us, Ordering::Relaxed);
        self.frame_count.fetch_add(1, Ordering::Relaxed);

        let mut history = self.frame_history.write();
        history.push_back(us);
        while history.len() > FRAME_HISTORY {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();

            let p95_idx = (sorted.len() as f32 * 0.95) as usize;
            let p99_idx = (sorted.len() as f32 * 0.99) as usize;

            self.frame_time_p95_us.store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.frame_time_p99_us.store(sorted[p99_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.frame_time_max_us.store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
        }
    }

    /// Refresh the entity gauges from the current state
    pub fn record_state(&self, state: &GameState) {
        let registry = &state.registry;
        let gauge = |counter: &AtomicU64, value: usize| counter.store(value as u64, Ordering::Relaxed);
        gauge(&self.entity_count, registry.len());
        gauge(&self.food_count, registry.count(EntityTag::Food));
        gauge(&self.alive_players, registry.count(EntityTag::Player));
        gauge(&self.respawn_pending, state.respawn_queue.len());
        gauge(&self.grenade_count, registry.count(EntityTag::GravityGrenade));
        gauge(&self.powerup_count, registry.count(EntityTag::Powerup));
    }

    /// Bump event counters for one frame's events
    pub fn record_events(&self, events: &[GameEvent]) {
        for event in events {
            let counter = match event {
                GameEvent::PlayerEaten { .. } => &self.players_eaten,
                GameEvent::PlayerRespawned { .. } => &self.respawns,
                GameEvent::GrenadeFired { .. } => &self.grenades_fired,
                GameEvent::PowerupCollected { .. } => &self.powerups_collected,
                GameEvent::GrenadeExpired { .. } | GameEvent::Spawned { .. } => continue,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            entities: EntityMetrics {
                total: load(&self.entity_count),
                food: load(&self.food_count),
                alive_players: load(&self.alive_players),
                respawn_pending: load(&self.respawn_pending),
                grenades: load(&self.grenade_count),
                powerups: load(&self.powerup_count),
            },
            events: EventMetrics {
                players_eaten: load(&self.players_eaten),
                respawns: load(&self.respawns),
                grenades_fired: load(&self.grenades_fired),
                powerups_collected: load(&self.powerups_collected),
            },
            performance: PerformanceMetrics {
                frame_count: load(&self.frame_count),
                frame_time_us: load(&self.frame_time_us),
                frame_time_p95_us: load(&self.frame_time_p95_us),
                frame_time_p99_us: load(&self.frame_time_p99_us),
                frame_time_max_us: load(&self.frame_time_max_us),
            },
            uptime_seconds: self.uptime_seconds(),
        }
    }

    /// Pretty-printed JSON of the current snapshot
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.snapshot()).unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize metrics: {}", e);
            String::from("{}")
        })
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
