//! Scalability benchmarks for the arena simulation
//!
//! Measures a full frame at increasing food counts with six roaming players,
//! plus the broad-phase grid on its own.
//!
//! Run with: cargo bench --bench scalability

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use amoeba_arena::config::SimulationConfig;
use amoeba_arena::game::constants::physics::DT;
use amoeba_arena::game::entity::PowerupKind;
use amoeba_arena::game::game_loop::step;
use amoeba_arena::game::input_buffer::{Intent, IntentTable};
use amoeba_arena::game::spatial::{Footprint, Rect, SpatialGrid};
use amoeba_arena::game::state::GameState;
use amoeba_arena::game::systems::spawning;
use amoeba_arena::util::vec2::Vec2;

const PLAYERS: u32 = 6;
const FOOD_COUNTS: [usize; 4] = [5_000, 10_000, 20_000, 40_000];

/// World with `food` pellets and six players, all spawners off so the entity
/// count stays put while measuring
fn create_state(food: usize) -> GameState {
    let mut config = SimulationConfig::without_spawning();
    config.food.max_count = food;
    let mut state = GameState::with_seed(config, 1234).expect("valid bench config");
    spawning::spawn_food(&mut state, food);
    for _ in 0..PLAYERS {
        state.add_player();
    }
    state
}

/// Every player steers in a random direction and aims where it goes
fn random_intents(rng: &mut StdRng) -> IntentTable {
    let mut intents = IntentTable::new();
    for player_id in 0..PLAYERS {
        let dir = Vec2::from_angle(rng.gen_range(0.0..std::f32::consts::TAU));
        intents.set(player_id, Intent::new(dir, dir, false));
    }
    intents
}

/// Benchmark a full frame (spawners, intents, integration, consumption, gravity)
fn bench_full_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_frame");
    group.sample_size(30);

    for food in FOOD_COUNTS {
        let mut state = create_state(food);
        let mut rng = StdRng::seed_from_u64(food as u64);
        let intents = random_intents(&mut rng);

        group.throughput(Throughput::Elements(food as u64));
        group.bench_with_input(BenchmarkId::new("six_players", food), &food, |b, _| {
            b.iter(|| {
                let now = state.time + DT as f64;
                black_box(step(&mut state, &intents, now, DT));
            })
        });
    }
    group.finish();
}

/// Benchmark a frame with live gravity grenades pulling the players
fn bench_frame_with_grenades(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_with_grenades");
    group.sample_size(30);

    for food in [5_000, 20_000] {
        let mut state = create_state(food);
        let ids: Vec<_> = state.registry.player_ids().to_vec();
        for id in ids {
            state.registry.update(id, |e| {
                if let Some(p) = e.as_player_mut() {
                    p.powerups.push(PowerupKind::GravityGrenadeLauncher);
                }
            });
        }

        let mut intents = IntentTable::new();
        for player_id in 0..PLAYERS {
            intents.set(player_id, Intent::new(Vec2::ZERO, Vec2::RIGHT, true));
        }
        // Fire once, then measure frames while the grenades are active
        step(&mut state, &intents, DT as f64, DT);
        state.time = 3.0;
        let idle = IntentTable::new();

        group.bench_with_input(BenchmarkId::new("six_grenades", food), &food, |b, _| {
            b.iter(|| {
                // Stay inside the active window
                let now = 3.0 + (state.frame % 300) as f64 * DT as f64;
                black_box(step(&mut state, &idle, now, DT));
            })
        });
    }
    group.finish();
}

/// Benchmark filling the grid and querying player-sized regions
fn bench_spatial_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_grid");
    group.sample_size(50);

    for count in FOOD_COUNTS {
        let mut rng = StdRng::seed_from_u64(count as u64);
        let footprints: Vec<Footprint> = (0..count)
            .map(|_| {
                Footprint::new(
                    Vec2::new(rng.gen_range(0.0..1600.0), rng.gen_range(0.0..1200.0)),
                    5.0,
                )
            })
            .collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("build_and_query", count), &count, |b, _| {
            b.iter(|| {
                let mut grid = SpatialGrid::new(1600.0, 1200.0, 32).expect("valid grid");
                for (id, footprint) in footprints.iter().enumerate() {
                    grid.add(id as u64, *footprint);
                }
                let hits: usize = (0..PLAYERS)
                    .map(|i| {
                        let center = Vec2::new(200.0 + 200.0 * i as f32, 600.0);
                        grid.query(&Rect::centered(center, 40.0)).len()
                    })
                    .sum();
                black_box(hits)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_frame, bench_frame_with_grenades, bench_spatial_grid);

criterion_main!(benches);
