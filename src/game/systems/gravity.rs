//! Gravity system for grenade emitters
//!
//! Active gravity grenades pull every moving entity within their influence
//! radius. All accelerations are computed against the same positions before
//! any velocity changes, then applied in one pass.

use crate::config::GrenadeConfig;
use crate::game::constants::grenade::{G, INFLUENCE_RADIUS, MAX_FORCE, MIN_DISTANCE_SQ};
use crate::game::constants::radius_to_mass;
use crate::game::entity::{EntityId, GameTime, GrenadePhase};
use crate::game::game_loop::GameEvent;
use crate::game::spatial::{EntitySet, Rect};
use crate::game::state::GameState;
use crate::util::vec2::Vec2;

/// Pull acceleration an emitter of `emitter_mass` exerts on a target of
/// `target_radius` at squared distance `distance_sq`, clamped to `MAX_FORCE`
#[inline]
pub fn pull_strength(emitter_mass: f32, target_radius: f32, distance_sq: f32) -> f32 {
    let force = G * emitter_mass * radius_to_mass(target_radius) / distance_sq;
    force.clamp(0.0, MAX_FORCE)
}

/// Velocity changes from every active emitter, keyed by target
pub fn collect_pulls(state: &GameState, now: GameTime, dt: f32) -> Vec<(EntityId, Vec2)> {
    let timing = &state.config.grenade;
    let registry = &state.registry;
    let influence_sq = INFLUENCE_RADIUS * INFLUENCE_RADIUS;

    let mut pulls = Vec::new();
    let mut candidates = EntitySet::default();

    for &emitter_id in registry.grenade_ids() {
        let Some(emitter) = registry.get(emitter_id) else {
            continue;
        };
        let Some(mass) = emitter.as_grenade().and_then(|g| g.emitter_mass(now, timing)) else {
            continue;
        };

        candidates.clear();
        registry.query_into(&Rect::centered(emitter.position, INFLUENCE_RADIUS), &mut candidates);

        for &target_id in candidates.iter() {
            if target_id == emitter_id {
                continue;
            }
            let Some(target) = registry.get(target_id) else {
                continue;
            };
            if !target.capabilities().moving {
                continue;
            }

            let delta = emitter.position - target.position;
            let distance_sq = delta.length_sq();
            // Too close for a direction, or outside the circle the square query over-covers
            if distance_sq < MIN_DISTANCE_SQ || distance_sq > influence_sq {
                continue;
            }

            let strength = pull_strength(mass, target.radius, distance_sq);
            let dir = delta * (1.0 / distance_sq.sqrt());
            pulls.push((target_id, dir * (strength * dt)));
        }
    }

    pulls
}

/// Apply emitter gravity for this frame
pub fn apply_emitters(state: &mut GameState, now: GameTime, dt: f32) {
    let pulls = collect_pulls(state, now, dt);
    if pulls.is_empty() {
        return;
    }
    tracing::trace!("Applying {} grenade pulls", pulls.len());
    for (target_id, dv) in pulls {
        state.registry.update(target_id, |e| e.velocity += dv);
    }
}

/// Remove grenades whose full lifetime has passed
pub fn remove_expired(state: &mut GameState, now: GameTime) -> Vec<GameEvent> {
    let expired = expired_grenades(state, now, &state.config.grenade);
    if expired.is_empty() {
        return Vec::new();
    }

    state
        .registry
        .remove_all(&expired)
        .into_iter()
        .map(|grenade| {
            tracing::debug!("Grenade {} expired", grenade.id());
            GameEvent::GrenadeExpired {
                grenade_id: grenade.id(),
            }
        })
        .collect()
}

fn expired_grenades(state: &GameState, now: GameTime, timing: &GrenadeConfig) -> EntitySet {
    state
        .registry
        .grenade_ids()
        .iter()
        .copied()
        .filter(|&id| {
            state
                .registry
                .get(id)
                .and_then(|e| e.as_grenade())
                .is_some_and(|g| g.phase(now, timing) == GrenadePhase::Expired)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::game::constants::grenade::{BASE_MASS, MASS_GROWTH};
    use crate::game::constants::physics::DT;
    use crate::game::entity::Entity;

    fn state() -> GameState {
        GameState::with_seed(SimulationConfig::without_spawning(), 5).unwrap()
    }

    /// Grenade created at t=0; active between 2s and 10s with default timing
    fn add_grenade(state: &mut GameState, position: Vec2) -> EntityId {
        state.registry.append(Entity::grenade(position, 0.0, None))
    }

    #[test]
    fn test_pull_strength_inverse_square() {
        let near = pull_strength(BASE_MASS, 1.0, 100.0 * 100.0);
        let far = pull_strength(BASE_MASS, 1.0, 200.0 * 200.0);
        assert!((near / far - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_pull_strength_clamped() {
        assert_eq!(pull_strength(BASE_MASS, 50.0, 1.0), MAX_FORCE);
        assert!(pull_strength(BASE_MASS, 1.0, 1e12) >= 0.0);
    }

    #[test]
    fn test_active_grenade_pulls_towards_itself() {
        let mut state = state();
        add_grenade(&mut state, Vec2::new(800.0, 600.0));
        let target = state
            .registry
            .append(Entity::amoeba(Vec2::new(700.0, 600.0), 5.0, [1, 2, 3]));

        apply_emitters(&mut state, 5.0, DT);

        let v = state.registry.get(target).unwrap().velocity;
        assert!(v.x > 0.0);
        assert!(v.y.abs() < 1e-6);

        // 5s is 3/8 of the way through the 2..10s active window
        let mass = BASE_MASS + MASS_GROWTH * 3.0 / 8.0;
        let expected = pull_strength(mass, 5.0, 100.0 * 100.0) * DT;
        assert!((v.x - expected).abs() < 1e-3);
    }

    #[test]
    fn test_armed_and_exploding_grenades_do_not_pull() {
        let mut state = state();
        add_grenade(&mut state, Vec2::new(800.0, 600.0));
        let target = state
            .registry
            .append(Entity::amoeba(Vec2::new(700.0, 600.0), 5.0, [1, 2, 3]));

        apply_emitters(&mut state, 1.0, DT);
        apply_emitters(&mut state, 11.0, DT);

        assert_eq!(state.registry.get(target).unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_static_and_distant_entities_unaffected() {
        let mut state = state();
        add_grenade(&mut state, Vec2::new(800.0, 600.0));
        let food = state.registry.append(Entity::food(Vec2::new(750.0, 600.0)));
        // Inside the query square's corner, outside the influence circle
        let corner = state
            .registry
            .append(Entity::amoeba(Vec2::new(1150.0, 950.0), 5.0, [1, 2, 3]));

        apply_emitters(&mut state, 5.0, DT);

        assert_eq!(state.registry.get(food).unwrap().velocity, Vec2::ZERO);
        assert_eq!(state.registry.get(corner).unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_coincident_target_skipped() {
        let mut state = state();
        add_grenade(&mut state, Vec2::new(800.0, 600.0));
        let target = state
            .registry
            .append(Entity::amoeba(Vec2::new(800.5, 600.0), 5.0, [1, 2, 3]));

        apply_emitters(&mut state, 5.0, DT);

        let v = state.registry.get(target).unwrap().velocity;
        assert!(v.is_finite());
        assert_eq!(v, Vec2::ZERO);
    }

    #[test]
    fn test_pulls_use_positions_before_any_update() {
        let mut state = state();
        // Two grenades pull each other symmetrically
        let a = add_grenade(&mut state, Vec2::new(700.0, 600.0));
        let b = add_grenade(&mut state, Vec2::new(900.0, 600.0));

        apply_emitters(&mut state, 5.0, DT);

        let va = state.registry.get(a).unwrap().velocity;
        let vb = state.registry.get(b).unwrap().velocity;
        assert!(va.x > 0.0 && vb.x < 0.0);
        assert!((va.x + vb.x).abs() < 1e-4);
    }

    #[test]
    fn test_expired_grenades_removed() {
        let mut state = state();
        let old = add_grenade(&mut state, Vec2::new(100.0, 100.0));
        let fresh = state
            .registry
            .append(Entity::grenade(Vec2::new(200.0, 200.0), 10.0, None));

        assert!(remove_expired(&mut state, 12.4).is_empty());
        let events = remove_expired(&mut state, 12.6);

        assert_eq!(events, vec![GameEvent::GrenadeExpired { grenade_id: old }]);
        assert!(!state.registry.contains(old));
        assert!(state.registry.contains(fresh));
        assert_eq!(state.registry.grenade_ids(), &[fresh]);
    }
}
