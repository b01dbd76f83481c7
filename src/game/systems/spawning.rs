//! Spawning system
//! Places food and power-ups across the world at configured rates, spawns
//! players and brings eaten players back after the respawn delay

use rand::Rng;

use crate::game::constants::{powerup, spawn};
use crate::game::entity::{Color, Entity, EntityId, EntityTag, GameTime, PlayerId, PowerupKind};
use crate::game::state::{GameState, RespawnEntry};
use crate::game::systems::physics::Bounds;
use crate::util::vec2::Vec2;

/// Fractional spawn accumulators; sub-1 rates per frame add up across frames
#[derive(Debug, Clone, Default)]
pub struct SpawnAccumulators {
    pub food: f32,
    pub powerups: f32,
}

/// Items spawned during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnReport {
    pub food: usize,
    pub powerups: usize,
}

/// Uniform position inside `bounds`, keeping `margin` from every edge.
/// Falls back to the center axis when the margin does not fit.
pub fn random_position<R: Rng + ?Sized>(rng: &mut R, bounds: &Bounds, margin: f32) -> Vec2 {
    let axis = |rng: &mut R, min: f32, max: f32| {
        let (lo, hi) = (min + margin, max - margin);
        if lo < hi {
            rng.gen_range(lo..hi)
        } else {
            (min + max) * 0.5
        }
    };
    let x = axis(&mut *rng, bounds.min.x, bounds.max.x);
    let y = axis(&mut *rng, bounds.min.y, bounds.max.y);
    Vec2::new(x, y)
}

/// Spawn up to `count` food items, respecting the configured maximum.
/// Returns how many were placed.
pub fn spawn_food(state: &mut GameState, count: usize) -> usize {
    let room = state
        .config
        .food
        .max_count
        .saturating_sub(state.registry.count(EntityTag::Food));
    let count = count.min(room);
    let bounds = state.registry.bounds();

    for _ in 0..count {
        let position = random_position(state.rng_mut(), &bounds, 0.0);
        state.registry.append(Entity::food(position));
    }

    if count > 0 {
        tracing::trace!("Spawned {} food", count);
    }
    count
}

/// Spawn one power-up of a random kind
pub fn spawn_powerup(state: &mut GameState) -> EntityId {
    let bounds = state.registry.bounds();
    let rng = state.rng_mut();
    let kind = PowerupKind::ALL[rng.gen_range(0..PowerupKind::ALL.len())];
    let position = random_position(rng, &bounds, powerup::RADIUS);
    let id = state.registry.append(Entity::powerup(position, kind));
    tracing::debug!("Spawned {:?} power-up {} at {:?}", kind, id, position);
    id
}

/// Spawn a fresh player entity at a random position away from the edges
pub fn spawn_player(state: &mut GameState, player_id: PlayerId, color: Color) -> EntityId {
    let bounds = state.registry.bounds();
    let position = random_position(state.rng_mut(), &bounds, spawn::PLAYER_MARGIN);
    state.registry.append(Entity::player(player_id, position, color))
}

/// Accumulate spawn rates and spawn when ready
pub fn update(state: &mut GameState, dt: f32) -> SpawnReport {
    let mut report = SpawnReport::default();

    let food = state.config.food.clone();
    if food.enabled && state.registry.count(EntityTag::Food) < food.max_count {
        state.spawn.food += food.spawn_rate * dt;
        let due = state.spawn.food.floor();
        if due >= 1.0 {
            state.spawn.food -= due;
            report.food = spawn_food(state, due as usize);
        }
    }

    let powerups = state.config.powerups.clone();
    if powerups.enabled && state.registry.count(EntityTag::Powerup) < powerups.max_count {
        state.spawn.powerups += powerups.spawn_rate * dt;
        while state.spawn.powerups >= 1.0
            && state.registry.count(EntityTag::Powerup) < powerups.max_count
        {
            spawn_powerup(state);
            state.spawn.powerups -= 1.0;
            report.powerups += 1;
        }
    }

    report
}

/// Queue an eaten player for respawn
pub fn schedule_respawn(state: &mut GameState, player_id: PlayerId, color: Color, now: GameTime) {
    state.respawn_queue.push_back(RespawnEntry {
        player_id,
        color,
        time_of_death: now,
    });
}

/// Respawn every queued player whose delay has passed. Players come back with
/// their old id and color at the initial size.
pub fn process_respawns(state: &mut GameState, now: GameTime) -> Vec<(PlayerId, EntityId)> {
    let mut respawned = Vec::new();
    while let Some(entry) = state.respawn_queue.front() {
        if now - entry.time_of_death <= spawn::RESPAWN_DELAY {
            break;
        }
        let Some(entry) = state.respawn_queue.pop_front() else {
            break;
        };
        let id = spawn_player(state, entry.player_id, entry.color);
        tracing::info!(
            "Player {} respawned after {:.1}s",
            entry.player_id,
            now - entry.time_of_death
        );
        respawned.push((entry.player_id, id));
    }
    respawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::game::constants::amoeba;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state_with(config: SimulationConfig) -> GameState {
        GameState::with_seed(config, 42).unwrap()
    }

    #[test]
    fn test_random_position_respects_margin() {
        let mut rng = StdRng::seed_from_u64(3);
        let bounds = Bounds::new(800.0, 600.0);
        for _ in 0..1000 {
            let p = random_position(&mut rng, &bounds, 50.0);
            assert!(p.x >= 50.0 && p.x < 750.0);
            assert!(p.y >= 50.0 && p.y < 550.0);
        }
    }

    #[test]
    fn test_random_position_margin_too_large() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = random_position(&mut rng, &Bounds::new(80.0, 60.0), 50.0);
        assert_eq!(p, Vec2::new(40.0, 30.0));
    }

    #[test]
    fn test_spawn_food_respects_max() {
        let mut config = SimulationConfig::without_spawning();
        config.food.max_count = 10;
        let mut state = state_with(config);
        assert_eq!(spawn_food(&mut state, 25), 10);
        assert_eq!(spawn_food(&mut state, 5), 0);
        assert_eq!(state.registry.count(EntityTag::Food), 10);
    }

    #[test]
    fn test_food_accumulates_across_frames() {
        let mut config = SimulationConfig::without_spawning();
        config.food.enabled = true;
        config.food.spawn_rate = 10.0;
        let mut state = state_with(config);

        // 10/s at 60 Hz: first item after six frames
        let mut total = 0;
        for _ in 0..5 {
            total += update(&mut state, 1.0 / 60.0).food;
        }
        assert_eq!(total, 0);
        for _ in 0..55 {
            total += update(&mut state, 1.0 / 60.0).food;
        }
        assert!((9..=10).contains(&total));
    }

    #[test]
    fn test_disabled_spawners_do_nothing() {
        let mut state = state_with(SimulationConfig::without_spawning());
        let report = update(&mut state, 100.0);
        assert_eq!(report, SpawnReport::default());
        assert!(state.registry.is_empty());
    }

    #[test]
    fn test_powerups_capped() {
        let mut config = SimulationConfig::without_spawning();
        config.powerups.enabled = true;
        config.powerups.spawn_rate = 100.0;
        config.powerups.max_count = 3;
        let mut state = state_with(config);

        update(&mut state, 1.0);
        update(&mut state, 1.0);
        assert_eq!(state.registry.count(EntityTag::Powerup), 3);
    }

    #[test]
    fn test_player_spawns_inside_margin() {
        let mut state = state_with(SimulationConfig::without_spawning());
        let id = spawn_player(&mut state, 4, [200, 10, 10]);
        let e = state.registry.get(id).unwrap();
        assert!(e.position.x >= spawn::PLAYER_MARGIN);
        assert_eq!(e.radius, amoeba::PLAYER_INIT_RADIUS);
        assert_eq!(e.as_player().unwrap().player_id, 4);
    }

    #[test]
    fn test_respawn_waits_for_delay() {
        let mut state = state_with(SimulationConfig::without_spawning());
        schedule_respawn(&mut state, 2, [10, 220, 30], 1.0);

        assert!(process_respawns(&mut state, 5.0).is_empty());
        assert!(process_respawns(&mut state, 6.0).is_empty());
        let respawned = process_respawns(&mut state, 6.1);
        assert_eq!(respawned.len(), 1);
        assert_eq!(respawned[0].0, 2);

        let e = state.player_entity(2).unwrap();
        assert_eq!(e.color, [10, 220, 30]);
        assert!(state.respawn_queue.is_empty());
    }

    #[test]
    fn test_respawns_in_death_order() {
        let mut state = state_with(SimulationConfig::without_spawning());
        schedule_respawn(&mut state, 0, [255, 0, 0], 0.0);
        schedule_respawn(&mut state, 1, [0, 255, 0], 3.0);

        let first = process_respawns(&mut state, 6.0);
        assert_eq!(first.iter().map(|r| r.0).collect::<Vec<_>>(), vec![0]);
        assert!(state.is_respawning(1));

        let second = process_respawns(&mut state, 9.0);
        assert_eq!(second.iter().map(|r| r.0).collect::<Vec<_>>(), vec![1]);
    }
}
