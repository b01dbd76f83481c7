pub mod constants;
pub mod entity;
pub mod game_loop;
pub mod input_buffer;
pub mod registry;
pub mod spatial;
pub mod state;
pub mod systems;
