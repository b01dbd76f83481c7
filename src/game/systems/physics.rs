use std::f32::consts::{PI, TAU};

use crate::game::constants::amoeba::AIM_SPEED;
use crate::game::constants::thrust_for_radius;
use crate::game::entity::Entity;
use crate::util::vec2::Vec2;

/// Per-frame damping factors for `dv/dt = -k * v` with `k = -ln(rate)`.
///
/// CRITICAL: integrated in closed form so the result does not depend on how a
/// span of time is split into frames; never `velocity *= constant` per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampedStep {
    /// rate^dt: velocity scale over the frame
    pub velocity_factor: f32,
    /// (rate^dt - 1) / ln(rate): displacement per unit of starting velocity
    pub displacement_factor: f32,
}

impl DampedStep {
    /// Factors for a frame of `dt` seconds. `damping_rate` must be in (0, 1).
    pub fn new(damping_rate: f32, dt: f32) -> Self {
        let pow_r_dt = damping_rate.powf(dt);
        Self {
            velocity_factor: pow_r_dt,
            displacement_factor: (pow_r_dt - 1.0) / damping_rate.ln(),
        }
    }
}

/// World rectangle entities are confined to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(width, height),
        }
    }
}

/// Integrate one moving entity over a frame.
///
/// Returns true if the position changed (the caller must then re-bucket the
/// entity in the spatial grid).
pub fn integrate(entity: &mut Entity, step: &DampedStep, bounds: &Bounds) -> bool {
    let old = entity.position;

    entity.position += entity.velocity * step.displacement_factor;
    entity.velocity *= step.velocity_factor;
    entity.position = entity.position.clamp(bounds.min, bounds.max);

    if !entity.position.is_finite() {
        entity.position = old;
    }
    if !entity.velocity.is_finite() {
        entity.velocity = Vec2::ZERO;
    }

    entity.position != old
}

/// Apply a player's movement intent; bigger amoebae accelerate more slowly
pub fn apply_thrust(entity: &mut Entity, move_dir: Vec2, dt: f32) {
    if move_dir.is_zero(1e-6) {
        return;
    }
    let strength = thrust_for_radius(entity.radius) * dt;
    entity.accelerate(move_dir, strength);
}

/// Wrap an angle difference into (-PI, PI]
#[inline]
pub fn wrap_angle(diff: f32) -> f32 {
    let wrapped = diff.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Normalize an angle into [0, 2*PI)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let normalized = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if normalized >= TAU {
        0.0
    } else {
        normalized
    }
}

/// Turn `current` toward the direction of `aim` along the shortest arc,
/// limited to `aim_speed * dt` radians. Zero aim keeps the current angle.
pub fn turn_towards(current: f32, aim: Vec2, aim_speed: f32, dt: f32) -> f32 {
    if aim.is_zero(1e-6) {
        return current;
    }
    let diff = wrap_angle(aim.angle() - current);
    let max_step = aim_speed * dt;
    normalize_angle(current + diff.clamp(-max_step, max_step))
}

/// Turn a player's turret toward its aim intent
pub fn update_aim(entity: &mut Entity, aim: Vec2, dt: f32) {
    if let Some(player) = entity.as_player_mut() {
        player.aim_angle = turn_towards(player.aim_angle, aim, AIM_SPEED, dt);
    }
}
