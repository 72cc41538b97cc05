//! Pathfinding and AI benchmarks for tactics_core.
//!
//! Run with: `cargo bench -p tactics_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tactics_core::prelude::*;

/// Open field with a broken wall across the middle.
fn walled_grid(size: u32) -> Grid {
    let mut grid = Grid::new(size, size);
    let middle = size as i32 / 2;
    for y in 0..size as i32 - 2 {
        grid.set_terrain(Coord::new(middle, y), TerrainKind::Wall)
            .expect("wall inside grid");
    }
    for x in (0..size as i32).step_by(3) {
        grid.set_terrain(Coord::new(x, middle + 1), TerrainKind::Rough)
            .expect("rough inside grid");
    }
    grid
}

pub fn find_path_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");
    for size in [16u32, 32, 64] {
        let grid = walled_grid(size);
        let end = Coord::new(size as i32 - 1, 0);
        group.bench_with_input(BenchmarkId::new("orthogonal", size), &grid, |b, grid| {
            b.iter(|| find_path(black_box(grid), Coord::new(0, 0), end, false, false));
        });
        group.bench_with_input(BenchmarkId::new("diagonal", size), &grid, |b, grid| {
            b.iter(|| find_path(black_box(grid), Coord::new(0, 0), end, true, false));
        });
    }
    group.finish();
}

pub fn find_range_benchmark(c: &mut Criterion) {
    let grid = walled_grid(64);
    let start = Coord::new(20, 40);
    let mut group = c.benchmark_group("find_range");
    for distance in [4, 8, 16] {
        group.bench_with_input(BenchmarkId::new("movement", distance), &distance, |b, &distance| {
            b.iter(|| find_range(black_box(&grid), start, distance, RangeOptions::movement(false)));
        });
    }
    group.finish();
}

pub fn ai_decide_benchmark(c: &mut Criterion) {
    let mut battle = Battle::new(walled_grid(32), BattleConfig::default());
    let mut first = None;
    for i in 0..8 {
        let ally = Unit::new("Ally", FactionId(0), Controller::Ai, Coord::new(2 + i, 4 + i));
        let enemy = Unit::new("Enemy", FactionId(1), Controller::Ai, Coord::new(20 + i, 20 - i))
            .with_ability(Ability::strike("Bolt", 20).with_range(4).with_mana_cost(10));
        let id = battle.add_unit(ally).expect("ally placement");
        battle.add_unit(enemy).expect("enemy placement");
        first.get_or_insert(id);
    }
    let acting = first.expect("at least one unit");
    let mut engine = AiDecisionEngine::new(7);

    c.bench_function("ai_decide", |b| {
        b.iter(|| engine.decide(black_box(battle.grid()), battle.roster(), acting));
    });
}

criterion_group!(benches, find_path_benchmark, find_range_benchmark, ai_decide_benchmark);
criterion_main!(benches);
