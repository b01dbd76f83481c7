/// Motion integration constants
pub mod physics {
    /// Fraction of velocity retained after one second of free motion.
    /// Integrated in closed form: velocity *= DAMPING_RATE.powf(dt)
    pub const DAMPING_RATE: f32 = 0.04;
    /// Default frame rate of the headless loop in Hz
    pub const TICK_RATE: u32 = 60;
    /// Nominal delta time per frame in seconds
    pub const DT: f32 = 1.0 / 60.0;
}

/// World and spatial grid defaults
pub mod world {
    pub const WIDTH: f32 = 1600.0;
    pub const HEIGHT: f32 = 1200.0;
    /// Grid is CELL_COUNT x CELL_COUNT cells
    pub const CELL_COUNT: usize = 32;
}

/// Amoeba sizing and control constants
pub mod amoeba {
    /// Radius of a freshly spawned player
    pub const PLAYER_INIT_RADIUS: f32 = 10.0;
    /// Thrust numerator: acceleration = PLAYER_THRUST / radius (units/s^2)
    pub const PLAYER_THRUST: f32 = 10_000.0;
    /// Turret turn rate in radians per second
    pub const AIM_SPEED: f32 = 2.0 * std::f32::consts::PI;
    /// Radius of food pellets
    pub const FOOD_RADIUS: f32 = 5.0;
    /// Fixed food color
    pub const FOOD_COLOR: [u8; 3] = [0, 255, 100];
    /// Channel value a random color must reach in at least one channel
    pub const BRIGHT_CHANNEL_MIN: u8 = 200;
}

/// Spawn and respawn constants
pub mod spawn {
    /// Distance kept from the world edge when spawning players
    pub const PLAYER_MARGIN: f32 = 50.0;
    /// Delay before an eaten player comes back (seconds)
    pub const RESPAWN_DELAY: f64 = 5.0;
    /// Default food spawn rate (items per second)
    pub const FOOD_RATE: f32 = 10.0;
    /// Food spawned when the world is created
    pub const FOOD_INITIAL: usize = 100;
    /// Upper bound on live food items
    pub const FOOD_MAX_COUNT: usize = 20_000;
    /// Default power-up spawn rate (items per second)
    pub const POWERUP_RATE: f32 = 0.1;
    /// Upper bound on power-ups lying in the world
    pub const POWERUP_MAX_COUNT: usize = 5;
}

/// Power-up constants
pub mod powerup {
    pub const RADIUS: f32 = 15.0;
    pub const LAUNCHER_COLOR: [u8; 3] = [180, 180, 0];
    pub const LASER_COLOR: [u8; 3] = [0, 0, 220];
    /// Grenades granted by one launcher pick-up
    pub const LAUNCHER_CHARGES: u32 = 3;
    /// Angular speed of the active power-up orbiting its owner (radians/s)
    pub const ORBIT_SPEED: f32 = 3.0;
    /// Gap between the owner's edge and the orbiting power-up's center
    pub const ORBIT_GAP: f32 = 8.0;
}

/// Gravity grenade constants
pub mod grenade {
    pub const RADIUS: f32 = 10.0;
    pub const COLOR: [u8; 3] = [255, 0, 0];
    /// Time after launch before the grenade starts pulling (seconds)
    pub const ARMING_TIME: f32 = 2.0;
    /// Time after launch at which the pull stops and the explosion starts (seconds)
    pub const FUSE_TIME: f32 = 10.0;
    /// Duration of the explosion phase (seconds)
    pub const EXPLOSION_TIME: f32 = 0.5;
    /// Minimum time between two shots of the same player (seconds)
    pub const RELOAD_TIME: f64 = 5.0;
    /// Launch speed added along the aim direction
    pub const LAUNCH_SPEED: f32 = 300.0;
    /// Extra distance between the shooter's edge and the spawned grenade
    pub const SPAWN_GAP: f32 = 10.0;
    /// Gravitational constant for the pull
    pub const G: f32 = 10.0;
    /// Emitter mass when the active phase starts
    pub const BASE_MASS: f32 = 1_000.0;
    /// Mass added by the end of the active phase
    pub const MASS_GROWTH: f32 = 4_000.0;
    /// Upper bound on the pull acceleration (units/s^2)
    pub const MAX_FORCE: f32 = 2_000.0;
    /// Distance beyond which the pull is negligible and not computed
    pub const INFLUENCE_RADIUS: f32 = 400.0;
    /// Targets closer than this (squared) are not pulled; direction is undefined
    pub const MIN_DISTANCE_SQ: f32 = 1.0;
}

/// Area of a circle; used as the mass proxy for gravity targets
#[inline]
pub fn radius_to_mass(radius: f32) -> f32 {
    std::f32::consts::PI * radius * radius
}

/// Acceleration a player of `radius` gets from full stick deflection
#[inline]
pub fn thrust_for_radius(radius: f32) -> f32 {
    amoeba::PLAYER_THRUST / radius.max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damping_rate_in_unit_interval() {
        assert!(physics::DAMPING_RATE > 0.0);
        assert!(physics::DAMPING_RATE < 1.0);
    }

    #[test]
    fn test_tick_rate() {
        assert!((physics::DT - 1.0 / physics::TICK_RATE as f32).abs() < 0.0001);
    }

    #[test]
    fn test_radius_to_mass() {
        let mass = radius_to_mass(10.0);
        assert!((mass - 314.159_27).abs() < 0.01);
    }

    #[test]
    fn test_thrust_smaller_is_faster() {
        assert!(thrust_for_radius(10.0) > thrust_for_radius(40.0));
        assert!((thrust_for_radius(10.0) - 1_000.0).abs() < 0.001);
        // Degenerate radii never blow up the thrust
        assert!(thrust_for_radius(0.0).is_finite());
    }

    #[test]
    fn test_powerup_larger_than_new_player() {
        // A fresh player has to grow before it can collect power-ups
        assert!(powerup::RADIUS > amoeba::PLAYER_INIT_RADIUS);
    }

    #[test]
    fn test_grenade_spawns_outside_shooter() {
        assert!(grenade::SPAWN_GAP >= grenade::RADIUS);
    }

    #[test]
    fn test_food_fits_in_new_player() {
        assert!(amoeba::FOOD_RADIUS < amoeba::PLAYER_INIT_RADIUS);
    }
}
