//! World entities
//!
//! Entities are a closed set of tagged variants sharing position, velocity,
//! radius and color. Registry bucketing is driven by the static capability
//! table on [`EntityTag`], never by inspecting variant payloads.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GrenadeConfig;
use crate::game::constants::{amoeba, grenade, powerup};
use crate::game::spatial::Footprint;
use crate::util::vec2::Vec2;

/// Registry-assigned identifier, unique for the registry's lifetime
pub type EntityId = u64;

/// Logical player identifier; survives respawns
pub type PlayerId = u32;

/// RGB color
pub type Color = [u8; 3];

/// Monotonic simulation time in seconds
pub type GameTime = f64;

/// Stable type tag used for rendering dispatch and capability lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    Food,
    Amoeba,
    Player,
    GravityGrenade,
    Powerup,
}

/// What an entity can do or have done to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Integrated every frame
    pub moving: bool,
    /// Grows the eater when consumed
    pub edible: bool,
    /// Controlled through an intent source
    pub player: bool,
    /// Applies force without contact
    pub emitter: bool,
    /// Picked up into a player's power-up queue
    pub collectible: bool,
}

impl EntityTag {
    pub const fn capabilities(self) -> Capabilities {
        match self {
            EntityTag::Food => Capabilities {
                moving: false,
                edible: true,
                player: false,
                emitter: false,
                collectible: false,
            },
            EntityTag::Amoeba => Capabilities {
                moving: true,
                edible: true,
                player: false,
                emitter: false,
                collectible: false,
            },
            EntityTag::Player => Capabilities {
                moving: true,
                edible: true,
                player: true,
                emitter: false,
                collectible: false,
            },
            EntityTag::GravityGrenade => Capabilities {
                moving: true,
                edible: false,
                player: false,
                emitter: true,
                collectible: false,
            },
            EntityTag::Powerup => Capabilities {
                moving: true,
                edible: false,
                player: false,
                emitter: false,
                collectible: true,
            },
        }
    }
}

/// Power-up kinds. Only the grenade launcher has behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    GravityGrenadeLauncher,
    Laser,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 2] = [PowerupKind::GravityGrenadeLauncher, PowerupKind::Laser];

    pub fn color(self) -> Color {
        match self {
            PowerupKind::GravityGrenadeLauncher => powerup::LAUNCHER_COLOR,
            PowerupKind::Laser => powerup::LASER_COLOR,
        }
    }

    /// Shots granted by one pick-up
    pub fn charges(self) -> u32 {
        match self {
            PowerupKind::GravityGrenadeLauncher => powerup::LAUNCHER_CHARGES,
            PowerupKind::Laser => 0,
        }
    }
}

/// A power-up lying in the world
#[derive(Debug, Clone, PartialEq)]
pub struct Powerup {
    pub kind: PowerupKind,
}

/// The power-up a player currently wields; it orbits its owner
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePowerup {
    pub kind: PowerupKind,
    pub charges: u32,
    /// Orbit angle around the owner (radians)
    pub orbit_angle: f32,
}

/// FIFO power-up queue: one active slot plus one reserve slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerupSlots {
    active: Option<ActivePowerup>,
    reserve: Option<PowerupKind>,
}

impl PowerupSlots {
    /// Enqueue a collected power-up. Returns false when both slots are taken.
    pub fn push(&mut self, kind: PowerupKind) -> bool {
        if self.active.is_none() {
            self.active = Some(ActivePowerup {
                kind,
                charges: kind.charges(),
                orbit_angle: 0.0,
            });
            true
        } else if self.reserve.is_none() {
            self.reserve = Some(kind);
            true
        } else {
            false
        }
    }

    pub fn is_full(&self) -> bool {
        self.active.is_some() && self.reserve.is_some()
    }

    pub fn active(&self) -> Option<&ActivePowerup> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ActivePowerup> {
        self.active.as_mut()
    }

    pub fn reserve(&self) -> Option<PowerupKind> {
        self.reserve
    }

    /// Spend one charge of the active power-up, promoting the reserve once it runs dry
    pub fn consume_charge(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.charges = active.charges.saturating_sub(1);
        if active.charges == 0 {
            self.active = None;
            if let Some(next) = self.reserve.take() {
                self.push(next);
            }
        }
    }
}

/// Player-controlled amoeba state
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerAmoeba {
    pub player_id: PlayerId,
    /// Turret angle in [0, 2*PI)
    pub aim_angle: f32,
    /// Time of the last grenade shot
    pub last_fired: GameTime,
    pub powerups: PowerupSlots,
}

impl PlayerAmoeba {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            aim_angle: 0.0,
            // Start with the weapon reloaded
            last_fired: f64::NEG_INFINITY,
            powerups: PowerupSlots::default(),
        }
    }

    pub fn is_reloaded(&self, now: GameTime, reload_time: GameTime) -> bool {
        now - self.last_fired >= reload_time
    }
}

/// Grenade lifecycle, driven purely by elapsed time since creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrenadePhase {
    /// Launched, not pulling yet
    Armed,
    /// Pulling nearby moving objects with growing mass
    Active,
    /// Visual explosion, no force
    Exploding,
    /// Due for removal
    Expired,
}

/// Time-limited gravity emitter
#[derive(Debug, Clone, PartialEq)]
pub struct GravityGrenade {
    pub creation_time: GameTime,
    pub owner: Option<PlayerId>,
}

impl GravityGrenade {
    pub fn new(creation_time: GameTime, owner: Option<PlayerId>) -> Self {
        Self {
            creation_time,
            owner,
        }
    }

    #[inline]
    pub fn elapsed(&self, now: GameTime) -> f32 {
        (now - self.creation_time) as f32
    }

    /// Phase at `now`. The fuse runs from creation, so the pull lasts from
    /// `arming_time` to `fuse_time`; removal happens once the full
    /// `arming + fuse + explosion` lifetime has passed.
    pub fn phase(&self, now: GameTime, timing: &GrenadeConfig) -> GrenadePhase {
        let elapsed = self.elapsed(now);
        if elapsed < timing.arming_time {
            GrenadePhase::Armed
        } else if elapsed < timing.fuse_time {
            GrenadePhase::Active
        } else if elapsed < timing.lifetime() {
            GrenadePhase::Exploding
        } else {
            GrenadePhase::Expired
        }
    }

    /// Progress through the active phase in [0, 1]; None outside it
    pub fn active_fraction(&self, now: GameTime, timing: &GrenadeConfig) -> Option<f32> {
        if self.phase(now, timing) != GrenadePhase::Active {
            return None;
        }
        let active_span = timing.fuse_time - timing.arming_time;
        if active_span <= 0.0 {
            return Some(1.0);
        }
        let into_active = self.elapsed(now) - timing.arming_time;
        Some((into_active / active_span).clamp(0.0, 1.0))
    }

    /// Linear mass ramp over the active phase
    pub fn emitter_mass(&self, now: GameTime, timing: &GrenadeConfig) -> Option<f32> {
        self.active_fraction(now, timing)
            .map(|fraction| grenade::BASE_MASS + grenade::MASS_GROWTH * fraction)
    }
}

/// Variant payloads
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Food,
    Amoeba,
    Player(PlayerAmoeba),
    GravityGrenade(GravityGrenade),
    Powerup(Powerup),
}

impl EntityKind {
    pub fn tag(&self) -> EntityTag {
        match self {
            EntityKind::Food => EntityTag::Food,
            EntityKind::Amoeba => EntityTag::Amoeba,
            EntityKind::Player(_) => EntityTag::Player,
            EntityKind::GravityGrenade(_) => EntityTag::GravityGrenade,
            EntityKind::Powerup(_) => EntityTag::Powerup,
        }
    }
}

/// A world object
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Assigned by the registry on append
    pub(crate) id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub color: Color,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(kind: EntityKind, position: Vec2, radius: f32, color: Color) -> Self {
        Self {
            id: 0,
            position,
            velocity: Vec2::ZERO,
            radius,
            color,
            kind,
        }
    }

    pub fn food(position: Vec2) -> Self {
        Self::new(EntityKind::Food, position, amoeba::FOOD_RADIUS, amoeba::FOOD_COLOR)
    }

    pub fn amoeba(position: Vec2, radius: f32, color: Color) -> Self {
        Self::new(EntityKind::Amoeba, position, radius, color)
    }

    pub fn player(player_id: PlayerId, position: Vec2, color: Color) -> Self {
        Self::new(
            EntityKind::Player(PlayerAmoeba::new(player_id)),
            position,
            amoeba::PLAYER_INIT_RADIUS,
            color,
        )
    }

    pub fn grenade(position: Vec2, creation_time: GameTime, owner: Option<PlayerId>) -> Self {
        Self::new(
            EntityKind::GravityGrenade(GravityGrenade::new(creation_time, owner)),
            position,
            grenade::RADIUS,
            grenade::COLOR,
        )
    }

    pub fn powerup(position: Vec2, kind: PowerupKind) -> Self {
        Self::new(
            EntityKind::Powerup(Powerup { kind }),
            position,
            powerup::RADIUS,
            kind.color(),
        )
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn tag(&self) -> EntityTag {
        self.kind.tag()
    }

    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.tag().capabilities()
    }

    #[inline]
    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.position, self.radius)
    }

    /// Add `dir * strength` to the velocity. `dir` is expected to be normalized.
    #[inline]
    pub fn accelerate(&mut self, dir: Vec2, strength: f32) {
        self.velocity += dir * strength;
    }

    /// Grow by absorbing a circle of `other_radius`, conserving area.
    ///
    /// No-op (returns false) if the other circle is bigger or its radius is
    /// not a positive finite number.
    pub fn eat(&mut self, other_radius: f32) -> bool {
        if !(other_radius > 0.0 && other_radius.is_finite()) || other_radius > self.radius {
            return false;
        }
        // sqrt((PI*R^2 + PI*r^2) / PI)
        self.radius = (self.radius * self.radius + other_radius * other_radius).sqrt();
        true
    }

    pub fn as_player(&self) -> Option<&PlayerAmoeba> {
        match &self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut PlayerAmoeba> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_grenade(&self) -> Option<&GravityGrenade> {
        match &self.kind {
            EntityKind::GravityGrenade(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_powerup(&self) -> Option<&Powerup> {
        match &self.kind {
            EntityKind::Powerup(p) => Some(p),
            _ => None,
        }
    }
}

/// Random color with at least one channel at or above `BRIGHT_CHANNEL_MIN`
pub fn random_bright_color<R: Rng + ?Sized>(rng: &mut R) -> Color {
    let mut color: Color = [rng.gen(), rng.gen(), rng.gen()];
    if color.iter().all(|&c| c < amoeba::BRIGHT_CHANNEL_MIN) {
        let channel = rng.gen_range(0..3);
        color[channel] = rng.gen_range(amoeba::BRIGHT_CHANNEL_MIN..=u8::MAX);
    }
    color
}
