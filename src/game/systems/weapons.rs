//! Weapon system for power-up firing
//!
//! Players fire the power-up in their active slot. Only the gravity grenade
//! launcher has behavior; it is gated by charges and a reload timer.

use std::f32::consts::TAU;

use crate::game::constants::grenade::{LAUNCH_SPEED, SPAWN_GAP};
use crate::game::constants::powerup::ORBIT_SPEED;
use crate::game::entity::{Entity, EntityId, GameTime, PowerupKind};
use crate::game::game_loop::GameEvent;
use crate::game::state::GameState;
use crate::util::vec2::Vec2;

/// Outcome of pulling the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireResult {
    Fired(EntityId),
    /// Nothing in the active slot
    NoWeapon,
    Reloading,
    /// Active power-up has no behavior and was dropped
    Discarded(PowerupKind),
}

/// Launch direction: turret if aiming, else current heading if moving, else turret
pub fn launch_direction(aim_angle: f32, aiming: bool, velocity: Vec2) -> Vec2 {
    if !aiming {
        let heading = velocity.normalize();
        if !heading.is_zero(1e-6) {
            return heading;
        }
    }
    Vec2::from_angle(aim_angle)
}

/// Fire the active power-up of the player entity `shooter_id`
pub fn try_fire(state: &mut GameState, shooter_id: EntityId, aiming: bool, now: GameTime) -> FireResult {
    let reload_time = state.config.grenade.reload_time;
    let Some(shooter) = state.registry.get(shooter_id) else {
        return FireResult::NoWeapon;
    };
    let Some(player) = shooter.as_player() else {
        return FireResult::NoWeapon;
    };
    let Some(active) = player.powerups.active() else {
        return FireResult::NoWeapon;
    };

    if active.kind != PowerupKind::GravityGrenadeLauncher {
        let kind = active.kind;
        state.registry.update(shooter_id, |e| {
            if let Some(p) = e.as_player_mut() {
                p.powerups.consume_charge();
            }
        });
        return FireResult::Discarded(kind);
    }
    if !player.is_reloaded(now, reload_time) {
        return FireResult::Reloading;
    }

    let owner = player.player_id;
    let dir = launch_direction(player.aim_angle, aiming, shooter.velocity);
    let position = shooter.position + dir * (shooter.radius + SPAWN_GAP);

    let mut grenade = Entity::grenade(position, now, Some(owner));
    // Inherit the shooter's momentum, then add the launch kick
    grenade.velocity = shooter.velocity;
    grenade.accelerate(dir, LAUNCH_SPEED);

    state.registry.update(shooter_id, |e| {
        if let Some(p) = e.as_player_mut() {
            p.last_fired = now;
            p.powerups.consume_charge();
        }
    });
    let grenade_id = state.registry.append(grenade);
    tracing::debug!("Player {} fired grenade {} towards {:?}", owner, grenade_id, dir);
    FireResult::Fired(grenade_id)
}

/// Fire and report as a game event when a grenade was launched
pub fn fire(state: &mut GameState, shooter_id: EntityId, aiming: bool, now: GameTime) -> Option<GameEvent> {
    match try_fire(state, shooter_id, aiming, now) {
        FireResult::Fired(grenade_id) => {
            let player_id = state
                .registry
                .get(shooter_id)
                .and_then(|e| e.as_player())
                .map(|p| p.player_id)?;
            Some(GameEvent::GrenadeFired {
                player_id,
                grenade_id,
            })
        }
        _ => None,
    }
}

/// Spin every active power-up around its owner
pub fn advance_orbits(state: &mut GameState, dt: f32) {
    let step = ORBIT_SPEED * dt;
    let players: Vec<EntityId> = state.registry.player_ids().to_vec();
    for id in players {
        state.registry.update(id, |e| {
            if let Some(active) = e.as_player_mut().and_then(|p| p.powerups.active_mut()) {
                active.orbit_angle = (active.orbit_angle + step).rem_euclid(TAU);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::game::constants::powerup::LAUNCHER_CHARGES;
    use crate::game::entity::EntityTag;

    fn armed_state() -> (GameState, EntityId) {
        let mut state = GameState::with_seed(SimulationConfig::without_spawning(), 8).unwrap();
        let id = state
            .registry
            .append(Entity::player(0, Vec2::new(400.0, 400.0), [250, 0, 0]));
        state.registry.update(id, |e| {
            e.as_player_mut()
                .unwrap()
                .powerups
                .push(PowerupKind::GravityGrenadeLauncher);
        });
        (state, id)
    }

    #[test]
    fn test_fire_spawns_grenade_outside_shooter() {
        let (mut state, shooter) = armed_state();
        let result = try_fire(&mut state, shooter, true, 0.0);

        let FireResult::Fired(grenade_id) = result else {
            panic!("expected a grenade, got {:?}", result);
        };
        let grenade = state.registry.get(grenade_id).unwrap();
        // Turret starts at angle 0, pointing along +x
        assert!(grenade.position.approx_eq(Vec2::new(400.0 + 10.0 + SPAWN_GAP, 400.0), 1e-4));
        assert!(grenade.velocity.approx_eq(Vec2::new(LAUNCH_SPEED, 0.0), 1e-3));
        assert_eq!(grenade.as_grenade().unwrap().owner, Some(0));
        assert_eq!(grenade.as_grenade().unwrap().creation_time, 0.0);
        assert_eq!(state.registry.grenade_ids(), &[grenade_id]);
    }

    #[test]
    fn test_grenade_inherits_shooter_velocity() {
        let (mut state, shooter) = armed_state();
        state.registry.update(shooter, |e| e.velocity = Vec2::new(0.0, 50.0));

        let FireResult::Fired(grenade_id) = try_fire(&mut state, shooter, true, 0.0) else {
            panic!("expected a grenade");
        };
        let v = state.registry.get(grenade_id).unwrap().velocity;
        assert!(v.approx_eq(Vec2::new(LAUNCH_SPEED, 50.0), 1e-3));
    }

    #[test]
    fn test_not_aiming_fires_along_heading() {
        let (mut state, shooter) = armed_state();
        state.registry.update(shooter, |e| e.velocity = Vec2::new(0.0, -20.0));

        let FireResult::Fired(grenade_id) = try_fire(&mut state, shooter, false, 0.0) else {
            panic!("expected a grenade");
        };
        let grenade = state.registry.get(grenade_id).unwrap();
        assert!(grenade.position.y < 400.0);
        assert!((grenade.position.x - 400.0).abs() < 1e-4);
    }

    #[test]
    fn test_launch_direction_fallbacks() {
        assert!(launch_direction(0.0, false, Vec2::ZERO).approx_eq(Vec2::RIGHT, 1e-6));
        assert!(launch_direction(0.0, true, Vec2::new(0.0, 5.0)).approx_eq(Vec2::RIGHT, 1e-6));
        assert!(launch_direction(0.0, false, Vec2::new(0.0, 5.0)).approx_eq(Vec2::new(0.0, 1.0), 1e-6));
        // Negative headings count as moving
        assert!(launch_direction(0.0, false, Vec2::new(-3.0, 0.0)).approx_eq(Vec2::new(-1.0, 0.0), 1e-6));
    }

    #[test]
    fn test_reload_gates_firing() {
        let (mut state, shooter) = armed_state();
        assert!(matches!(try_fire(&mut state, shooter, true, 1.0), FireResult::Fired(_)));
        assert_eq!(try_fire(&mut state, shooter, true, 3.0), FireResult::Reloading);
        assert!(matches!(try_fire(&mut state, shooter, true, 6.0), FireResult::Fired(_)));
    }

    #[test]
    fn test_charges_run_out() {
        let (mut state, shooter) = armed_state();
        for shot in 0..LAUNCHER_CHARGES {
            let now = shot as f64 * 10.0;
            assert!(matches!(try_fire(&mut state, shooter, true, now), FireResult::Fired(_)));
        }
        assert_eq!(try_fire(&mut state, shooter, true, 100.0), FireResult::NoWeapon);
        assert_eq!(state.registry.count(EntityTag::GravityGrenade), LAUNCHER_CHARGES as usize);
    }

    #[test]
    fn test_no_weapon_without_powerup() {
        let mut state = GameState::with_seed(SimulationConfig::without_spawning(), 8).unwrap();
        let id = state.registry.append(Entity::player(0, Vec2::new(400.0, 400.0), [250, 0, 0]));
        assert_eq!(try_fire(&mut state, id, true, 0.0), FireResult::NoWeapon);
        assert_eq!(try_fire(&mut state, 999, true, 0.0), FireResult::NoWeapon);
    }

    #[test]
    fn test_inert_powerup_discarded_and_reserve_promoted() {
        let mut state = GameState::with_seed(SimulationConfig::without_spawning(), 8).unwrap();
        let id = state.registry.append(Entity::player(0, Vec2::new(400.0, 400.0), [250, 0, 0]));
        state.registry.update(id, |e| {
            let slots = &mut e.as_player_mut().unwrap().powerups;
            slots.push(PowerupKind::Laser);
            slots.push(PowerupKind::GravityGrenadeLauncher);
        });

        assert_eq!(
            try_fire(&mut state, id, true, 0.0),
            FireResult::Discarded(PowerupKind::Laser)
        );
        assert!(matches!(try_fire(&mut state, id, true, 0.0), FireResult::Fired(_)));
    }

    #[test]
    fn test_fire_event() {
        let (mut state, shooter) = armed_state();
        let event = fire(&mut state, shooter, true, 0.0).unwrap();
        assert!(matches!(event, GameEvent::GrenadeFired { player_id: 0, .. }));
        assert!(fire(&mut state, shooter, true, 1.0).is_none());
    }

    #[test]
    fn test_orbit_advances() {
        let (mut state, shooter) = armed_state();
        advance_orbits(&mut state, 0.5);
        let angle = state
            .registry
            .get(shooter)
            .and_then(|e| e.as_player())
            .and_then(|p| p.powerups.active())
            .map(|a| a.orbit_angle)
            .unwrap();
        assert!((angle - ORBIT_SPEED * 0.5).abs() < 1e-6);
    }
}
