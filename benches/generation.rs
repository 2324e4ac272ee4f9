//! Benchmarks for world generation and stepping.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use drapon::{
    generate_world, seeded_random, CaveGenerator, Direction, GameConfig, GameState,
    OverworldGenerator,
};

fn bench_generate_world(c: &mut Criterion) {
    c.bench_function("generate_world", |b| {
        b.iter(|| black_box(generate_world(black_box(42))));
    });
}

fn bench_overworld(c: &mut Criterion) {
    let generator = OverworldGenerator::new();
    c.bench_function("overworld_build", |b| {
        b.iter(|| black_box(generator.build()));
    });
}

fn bench_cave(c: &mut Criterion) {
    let generator = CaveGenerator::new();
    let mut seed = 0u64;
    c.bench_function("cave_build", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(generator.build(&mut seeded_random(seed)))
        });
    });
}

fn bench_walk(c: &mut Criterion) {
    let mut state = GameState::new(42, GameConfig::for_testing());
    state.confirm();
    c.bench_function("move_player_back_and_forth", |b| {
        b.iter(|| {
            black_box(state.move_player(Direction::Down));
            black_box(state.move_player(Direction::Up));
        });
    });
}

criterion_group!(
    benches,
    bench_generate_world,
    bench_overworld,
    bench_cave,
    bench_walk
);
criterion_main!(benches);
