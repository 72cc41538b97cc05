//! Proptest strategies for core types.

use proptest::prelude::*;
use tactics_core::prelude::*;

/// Any coordinate inside a `width` x `height` grid.
pub fn coord_in(width: u32, height: u32) -> impl Strategy<Value = Coord> {
    (0..width as i32, 0..height as i32).prop_map(|(x, y)| Coord::new(x, y))
}

/// Map rows of the given size with random terrain, mostly plain.
pub fn map_rows(width: usize, height: usize) -> impl Strategy<Value = Vec<String>> {
    let symbol = prop_oneof![
        6 => Just('.'),
        1 => Just(','),
        1 => Just('^'),
        1 => Just('#'),
        1 => Just('~'),
    ];
    prop::collection::vec(prop::collection::vec(symbol, width), height)
        .prop_map(|rows| {
            rows.into_iter()
                .map(|row| row.into_iter().collect::<String>())
                .collect::<Vec<_>>()
        })
}

/// A random-terrain grid between 2x2 and `max_side` x `max_side`.
pub fn terrain_grid(max_side: u32) -> impl Strategy<Value = Grid> {
    (2..=max_side as usize, 2..=max_side as usize)
        .prop_flat_map(|(width, height)| map_rows(width, height))
        .prop_map(|rows| Grid::from_rows(&rows).expect("generated rows are well formed"))
}

/// A random-terrain grid together with two in-bounds coordinates.
pub fn grid_with_endpoints(max_side: u32) -> impl Strategy<Value = (Grid, Coord, Coord)> {
    terrain_grid(max_side).prop_flat_map(|grid| {
        let (width, height) = (grid.width(), grid.height());
        (Just(grid), coord_in(width, height), coord_in(width, height))
    })
}

/// Plausible unit stats with positive speed and health.
pub fn unit_stats() -> impl Strategy<Value = UnitStats> {
    (
        0..7u32,
        1..4u32,
        1..200u32,
        0..40u32,
        0..40u32,
        0..30u32,
        1..40u32,
        any::<bool>(),
    )
        .prop_map(
            |(movement, attack_range, health, attack_power, intelligence, defence, speed, diagonal)| UnitStats {
                movement_distance: movement,
                attack_range,
                max_health: health,
                current_health: health,
                attack_power,
                intelligence,
                defence,
                resistance: defence,
                speed_rating: speed,
                can_move_diagonally: diagonal,
                ..UnitStats::default()
            },
        )
}

/// Speed ratings for a handful of units.
pub fn speeds(max_units: usize) -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1..60u32, 1..=max_units)
}
