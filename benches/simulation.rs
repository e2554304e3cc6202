//! Performance benchmarks for BLOBSIM

use blobsim::config::CombatConfig;
use blobsim::team::duel_damage;
use blobsim::{Config, World};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn benchmark_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");

    for population in [50, 200, 500].iter() {
        let mut config = Config::default();
        config.lifecycle.initial_population = *population;
        config.lifecycle.max_population = (*population).max(500);

        let mut world = World::new_with_seed(config, 42);

        // Warm up
        world.run(10);

        group.bench_with_input(
            BenchmarkId::new("population", population),
            population,
            |b, _| {
                b.iter(|| {
                    world.step();
                });
            },
        );
    }

    group.finish();
}

fn benchmark_steering(c: &mut Criterion) {
    let mut config = Config::default();
    config.lifecycle.initial_population = 200;
    let world = World::new_with_seed(config, 42);
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let agent = &world.agents[0];

    c.bench_function("agent_separate", |b| {
        b.iter(|| agent.separate(black_box(&world.agents), &mut rng));
    });

    c.bench_function("agent_cohesion", |b| {
        b.iter(|| agent.cohesion(black_box(&world.agents)));
    });

    c.bench_function("agent_attachment", |b| {
        b.iter(|| agent.attachment(black_box(&world.agents), 6));
    });
}

fn benchmark_duel_damage(c: &mut Criterion) {
    let cfg = CombatConfig {
        base_damage: 8.0,
        team_size_protection: 0.05,
        large_penalty_threshold: 6,
        large_penalty_rate: 0.15,
        winner_life_gain: 0.4,
        aggression_winner_increase: 4.0,
        aggression_loser_increase: 10.0,
        combat_duration: 180,
        absorption_chance: 0.08,
    };

    c.bench_function("duel_damage", |b| {
        b.iter(|| {
            duel_damage(
                black_box(90),
                black_box(35),
                black_box(7),
                black_box(&cfg),
                black_box(0.5),
            )
        });
    });
}

criterion_group!(
    benches,
    benchmark_world_step,
    benchmark_steering,
    benchmark_duel_damage,
);

criterion_main!(benches);
