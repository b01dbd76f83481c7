pub mod consumption;
pub mod gravity;
pub mod physics;
pub mod spawning;
pub mod weapons;
