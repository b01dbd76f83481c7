//! Simulation configuration
//!
//! Every value has a default from `game::constants` and can be overridden
//! through environment variables (a `.env` file is honored by the binary).
//! Invalid values are rejected at construction time via [`ConfigError`].

use std::str::FromStr;

use crate::game::constants::{grenade, physics, spawn, world};

/// Construction-time configuration errors.
///
/// These invalidate every index computation downstream, so the registry and
/// grid refuse to be built with them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid cell count must be at least 1")]
    ZeroCellCount,
    #[error("World dimensions must be positive and finite, got {width}x{height}")]
    InvalidWorldSize { width: f32, height: f32 },
    #[error("World {width}x{height} is too small for {cell_count} cells per axis")]
    CellTooSmall {
        width: f32,
        height: f32,
        cell_count: usize,
    },
    #[error("Damping rate must be in (0, 1), got {0}")]
    InvalidDampingRate(f32),
    #[error("Tick rate must be at least 1 Hz")]
    ZeroTickRate,
    #[error("Grenade durations must be non-negative, finite and fuse >= arming")]
    InvalidGrenadeTiming,
}

/// World bounds and spatial grid resolution
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Number of cells per axis
    pub cell_count: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: world::WIDTH,
            height: world::HEIGHT,
            cell_count: world::CELL_COUNT,
        }
    }
}

impl WorldConfig {
    pub fn new(width: f32, height: f32, cell_count: usize) -> Self {
        Self {
            width,
            height,
            cell_count,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_count == 0 {
            return Err(ConfigError::ZeroCellCount);
        }
        let valid_dim = |d: f32| d.is_finite() && d > 0.0;
        if !valid_dim(self.width) || !valid_dim(self.height) {
            return Err(ConfigError::InvalidWorldSize {
                width: self.width,
                height: self.height,
            });
        }
        // Cell sizes are integer-truncated; a zero-sized cell breaks the index math
        let cells = self.cell_count as i64;
        if (self.width as i64) / cells == 0 || (self.height as i64) / cells == 0 {
            return Err(ConfigError::CellTooSmall {
                width: self.width,
                height: self.height,
                cell_count: self.cell_count,
            });
        }
        Ok(())
    }
}

/// Motion integration settings
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsConfig {
    pub damping_rate: f32,
    pub tick_rate: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            damping_rate: physics::DAMPING_RATE,
            tick_rate: physics::TICK_RATE,
        }
    }
}

/// Food spawner settings
#[derive(Debug, Clone, PartialEq)]
pub struct FoodSpawnConfig {
    pub enabled: bool,
    /// Items placed when the world is populated
    pub initial: usize,
    /// Items per second
    pub spawn_rate: f32,
    pub max_count: usize,
}

impl Default for FoodSpawnConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial: spawn::FOOD_INITIAL,
            spawn_rate: spawn::FOOD_RATE,
            max_count: spawn::FOOD_MAX_COUNT,
        }
    }
}

/// Power-up spawner settings
#[derive(Debug, Clone, PartialEq)]
pub struct PowerupSpawnConfig {
    pub enabled: bool,
    /// Items per second
    pub spawn_rate: f32,
    pub max_count: usize,
}

impl Default for PowerupSpawnConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spawn_rate: spawn::POWERUP_RATE,
            max_count: spawn::POWERUP_MAX_COUNT,
        }
    }
}

/// Gravity grenade lifecycle timing
#[derive(Debug, Clone, PartialEq)]
pub struct GrenadeConfig {
    pub arming_time: f32,
    pub fuse_time: f32,
    pub explosion_time: f32,
    pub reload_time: f64,
}

impl Default for GrenadeConfig {
    fn default() -> Self {
        Self {
            arming_time: grenade::ARMING_TIME,
            fuse_time: grenade::FUSE_TIME,
            explosion_time: grenade::EXPLOSION_TIME,
            reload_time: grenade::RELOAD_TIME,
        }
    }
}

impl GrenadeConfig {
    /// Total time from launch until removal
    pub fn lifetime(&self) -> f32 {
        self.arming_time + self.fuse_time + self.explosion_time
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = |t: f32| t.is_finite() && t >= 0.0;
        if ok(self.arming_time)
            && ok(self.fuse_time)
            && ok(self.explosion_time)
            && self.reload_time.is_finite()
            && self.reload_time >= 0.0
            && self.fuse_time >= self.arming_time
        {
            Ok(())
        } else {
            Err(ConfigError::InvalidGrenadeTiming)
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub physics: PhysicsConfig,
    pub food: FoodSpawnConfig,
    pub powerups: PowerupSpawnConfig,
    pub grenade: GrenadeConfig,
}

impl SimulationConfig {
    /// Config with both spawners switched off; the world only contains what
    /// the caller puts in it.
    pub fn without_spawning() -> Self {
        let mut config = Self::default();
        config.food.enabled = false;
        config.food.initial = 0;
        config.powerups.enabled = false;
        config
    }

    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        override_from_env("WORLD_WIDTH", &mut config.world.width, |v| *v > 0.0);
        override_from_env("WORLD_HEIGHT", &mut config.world.height, |v| *v > 0.0);
        override_from_env("GRID_CELLS", &mut config.world.cell_count, |v| *v > 0 && *v <= 4096);

        override_from_env("DAMPING_RATE", &mut config.physics.damping_rate, |v| *v > 0.0 && *v < 1.0);
        override_from_env("TICK_RATE", &mut config.physics.tick_rate, |v| *v > 0 && *v <= 1000);

        override_from_env("FOOD_SPAWN_ENABLED", &mut config.food.enabled, |_| true);
        override_from_env("FOOD_INITIAL", &mut config.food.initial, |_| true);
        override_from_env("FOOD_SPAWN_RATE", &mut config.food.spawn_rate, |v| *v >= 0.0);
        override_from_env("FOOD_MAX_COUNT", &mut config.food.max_count, |_| true);

        override_from_env("POWERUP_SPAWN_ENABLED", &mut config.powerups.enabled, |_| true);
        override_from_env("POWERUP_SPAWN_RATE", &mut config.powerups.spawn_rate, |v| *v >= 0.0);
        override_from_env("POWERUP_MAX_COUNT", &mut config.powerups.max_count, |_| true);

        override_from_env("GRENADE_ARMING_TIME", &mut config.grenade.arming_time, |v| *v >= 0.0);
        override_from_env("GRENADE_FUSE_TIME", &mut config.grenade.fuse_time, |v| *v >= 0.0);
        override_from_env("GRENADE_EXPLOSION_TIME", &mut config.grenade.explosion_time, |v| *v >= 0.0);
        override_from_env("GRENADE_RELOAD_TIME", &mut config.grenade.reload_time, |v| *v >= 0.0);

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world.validate()?;
        let rate = self.physics.damping_rate;
        if !(rate > 0.0 && rate < 1.0) {
            return Err(ConfigError::InvalidDampingRate(rate));
        }
        if self.physics.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        self.grenade.validate()
    }
}

/// Replace `target` with the parsed env var if it is present, parses and passes `valid`
fn override_from_env<T>(name: &str, target: &mut T, valid: impl Fn(&T) -> bool)
where
    T: FromStr + std::fmt::Debug,
{
    let Ok(raw) = std::env::var(name) else {
        return;
    };
    match raw.parse::<T>() {
        Ok(parsed) if valid(&parsed) => *target = parsed,
        Ok(parsed) => {
            tracing::warn!("{} value {:?} out of range, using default {:?}", name, parsed, target)
        }
        Err(_) => tracing::warn!("Invalid {} '{}', using default {:?}", name, raw, target),
    }
}
