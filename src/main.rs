use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use amoeba_arena::config::SimulationConfig;
use amoeba_arena::game::entity::PlayerId;
use amoeba_arena::game::game_loop::GameLoop;
use amoeba_arena::game::input_buffer::{InputBufferError, InputSender, Intent};
use amoeba_arena::game::state::GameState;
use amoeba_arena::metrics::Metrics;
use amoeba_arena::util::vec2::Vec2;

/// Scripted players wander: every few frames each one picks a new heading,
/// turns its turret a little and fires now and then
async fn drive_players(sender: InputSender, players: Vec<PlayerId>, tick_rate: u32) {
    let mut rng = StdRng::from_entropy();
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(4.0 / tick_rate.max(1) as f64));
    let mut headings: Vec<f32> = players
        .iter()
        .map(|_| rng.gen_range(0.0..std::f32::consts::TAU))
        .collect();

    loop {
        ticker.tick().await;
        for (player_id, heading) in players.iter().zip(headings.iter_mut()) {
            *heading += rng.gen_range(-0.6..0.6);
            let aim = *heading + rng.gen_range(-1.0..1.0);
            let intent = Intent::new(Vec2::from_angle(*heading), Vec2::from_angle(aim), rng.gen_bool(0.05));

            match sender.try_send(*player_id, intent) {
                Ok(()) | Err(InputBufferError::Full) => {}
                Err(InputBufferError::Disconnected) => return,
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Amoeba Arena v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = SimulationConfig::load_or_default();
    config.validate().context("invalid simulation configuration")?;
    info!(
        "Configuration loaded: world {}x{}, grid {}x{}, {} Hz",
        config.world.width,
        config.world.height,
        config.world.cell_count,
        config.world.cell_count,
        config.physics.tick_rate
    );

    let player_count: u32 = std::env::var("PLAYERS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(4);
    let max_frames: Option<u64> = std::env::var("FRAMES").ok().and_then(|s| s.parse().ok());

    let mut state = GameState::new(config).context("failed to build world")?;
    let food = state.spawn_initial();
    let players: Vec<PlayerId> = (0..player_count).map(|_| state.add_player()).collect();
    info!("World populated: {} food, {} players", food, players.len());

    let metrics = Arc::new(Metrics::new());
    let mut game = GameLoop::new(state, metrics.clone());

    let tick_rate = game.state().config.physics.tick_rate;
    tokio::spawn(drive_players(game.sender(), players, tick_rate));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    let frames = game.run(max_frames, shutdown).await;
    info!("Simulation finished after {} frames", frames);
    info!("Final metrics:\n{}", metrics.to_json());

    if let Ok(path) = std::env::var("SNAPSHOT_PATH") {
        let snapshot = serde_json::to_string_pretty(&game.state().snapshot())
            .context("failed to serialize snapshot")?;
        std::fs::write(&path, snapshot).with_context(|| format!("failed to write snapshot to {}", path))?;
        info!("Snapshot written to {}", path);
    }

    Ok(())
}
