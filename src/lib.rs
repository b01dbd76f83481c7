//! Amoeba Arena simulation core
//!
//! A frame-stepped arena where player-controlled amoebae grow by eating
//! smaller entities, collect power-ups and fire gravity grenades.
//!
//! - `game::spatial` - uniform grid broad phase
//! - `game::registry` - entity ownership, typed views and grid consistency
//! - `game::game_loop` - per-frame orchestration and the headless loop driver

pub mod config;
pub mod game;
pub mod metrics;
pub mod util;
