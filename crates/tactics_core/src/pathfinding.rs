//! Grid pathfinding and range queries.
//!
//! All three queries are pure functions of a `&Grid`. Scratch state
//! (g-costs, parents, heap positions, visited distances) lives in tables
//! local to each call, indexed by the cell's row-major index, so queries
//! can run side by side on the same grid.
//!
//! Costs are integers. A* uses 10 per orthogonal step and 14 per diagonal
//! step plus the entered cell's extra move cost; range queries count
//! `1 + move_cost` (or a flat 1) per step.

use std::collections::VecDeque;

use tracing::trace;

use crate::error::{GameError, Result};
use crate::grid::{Coord, Grid};
use crate::heap::{HeapItem, IndexedHeap};
use crate::unit::UnitId;

/// A* cost of one orthogonal step.
pub const STRAIGHT_COST: u32 = 10;

/// A* cost of one diagonal step (10 * sqrt(2), rounded).
pub const DIAGONAL_COST: u32 = 14;

/// Octile distance between two cells in A* cost units.
///
/// Without diagonal movement this is the Manhattan distance times
/// [`STRAIGHT_COST`].
#[must_use]
pub fn octile_distance(a: Coord, b: Coord, allow_diagonal: bool) -> u32 {
    let dx = a.x.abs_diff(b.x);
    let dy = a.y.abs_diff(b.y);
    if allow_diagonal {
        let diagonal = dx.min(dy);
        let straight = dx.max(dy) - diagonal;
        DIAGONAL_COST * diagonal + STRAIGHT_COST * straight
    } else {
        STRAIGHT_COST * (dx + dy)
    }
}

/// Open-set entry for A*: lower `f` first, then lower `h`.
///
/// The cell index is the final key so equal-cost candidates always pop in
/// the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    index: usize,
}

impl HeapItem for OpenNode {
    fn slot(&self) -> usize {
        self.index
    }
}

/// Per-cell A* bookkeeping.
#[derive(Debug, Clone, Copy)]
struct Scratch {
    g: u32,
    parent: Option<usize>,
    closed: bool,
}

impl Scratch {
    const UNVISITED: Self = Self {
        g: u32::MAX,
        parent: None,
        closed: false,
    };
}

fn require_in_bounds(grid: &Grid, coord: Coord) -> Result<usize> {
    grid.index_of(coord).ok_or(GameError::OutOfBounds {
        coord,
        width: grid.width(),
        height: grid.height(),
    })
}

/// Shortest path from `start` to `end`.
///
/// The returned path excludes `start` and ends with `end`. It is empty if
/// `end` is unreachable, if either endpoint is not walkable, or if
/// `start == end`.
///
/// Cells occupied by a unit are impassable unless `pass_through_occupied`
/// is set; the end cell itself may always be occupied, so a path can lead
/// up to a target.
///
/// # Errors
///
/// [`GameError::OutOfBounds`] if either endpoint lies outside the grid.
pub fn find_path(
    grid: &Grid,
    start: Coord,
    end: Coord,
    allow_diagonal: bool,
    pass_through_occupied: bool,
) -> Result<Vec<Coord>> {
    let start_index = require_in_bounds(grid, start)?;
    let end_index = require_in_bounds(grid, end)?;

    if !grid.cell(start_index).walkable || !grid.cell(end_index).walkable {
        trace!(%start, %end, "path endpoint not walkable");
        return Ok(Vec::new());
    }
    if start_index == end_index {
        return Ok(Vec::new());
    }

    let mut scratch = vec![Scratch::UNVISITED; grid.cell_count()];
    let mut open = IndexedHeap::with_capacity(grid.cell_count());

    let h = octile_distance(start, end, allow_diagonal);
    scratch[start_index].g = 0;
    open.push(OpenNode {
        f: h,
        h,
        index: start_index,
    });

    while let Ok(current) = open.pop_best() {
        if current.index == end_index {
            let path = retrace(grid, &scratch, start_index, end_index);
            trace!(%start, %end, steps = path.len(), "path found");
            return Ok(path);
        }
        scratch[current.index].closed = true;

        let here = grid.coord_of(current.index);
        let current_g = scratch[current.index].g;

        for next in grid.neighbors(here, allow_diagonal) {
            let Some(next_index) = grid.index_of(next) else {
                continue;
            };
            if scratch[next_index].closed {
                continue;
            }

            let cell = grid.cell(next_index);
            let blocked_by_unit =
                cell.occupant.is_some() && !pass_through_occupied && next_index != end_index;
            if !cell.walkable || blocked_by_unit {
                scratch[next_index].closed = true;
                continue;
            }

            let step = if next.x != here.x && next.y != here.y {
                DIAGONAL_COST
            } else {
                STRAIGHT_COST
            };
            let g = current_g.saturating_add(step).saturating_add(cell.move_cost);
            if g >= scratch[next_index].g {
                continue;
            }

            scratch[next_index].g = g;
            scratch[next_index].parent = Some(current.index);
            let h = octile_distance(next, end, allow_diagonal);
            let node = OpenNode {
                f: g.saturating_add(h),
                h,
                index: next_index,
            };
            if !open.update(node) {
                open.push(node);
            }
        }
    }

    trace!(%start, %end, "no path");
    Ok(Vec::new())
}

/// Walk parent links back from `end`, returning `start`-exclusive order.
fn retrace(grid: &Grid, scratch: &[Scratch], start_index: usize, end_index: usize) -> Vec<Coord> {
    let mut path = Vec::new();
    let mut current = end_index;
    while current != start_index {
        path.push(grid.coord_of(current));
        match scratch[current].parent {
            Some(parent) => current = parent,
            None => break,
        }
    }
    path.reverse();
    path
}

/// Movement points needed to walk a path: `1 + move_cost` per entered cell.
///
/// Out-of-bounds coordinates count as a single step.
#[must_use]
pub fn path_movement_cost(grid: &Grid, path: &[Coord]) -> u32 {
    path.iter()
        .map(|&coord| 1 + grid.cell_at(coord).map_or(0, |cell| cell.move_cost))
        .fold(0, u32::saturating_add)
}

/// Flags for [`find_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeOptions {
    /// Expand to the 8 surrounding cells instead of 4.
    pub allow_diagonal: bool,
    /// Each step costs `1 + move_cost` instead of 1.
    pub weight_by_move_cost: bool,
    /// Put the origin cell first in the result.
    pub include_start: bool,
    /// Occupied cells are part of the result and expanded through.
    pub allow_occupied: bool,
}

impl RangeOptions {
    /// Cells a unit can walk to: weighted, excluding occupied cells and the origin.
    #[must_use]
    pub const fn movement(allow_diagonal: bool) -> Self {
        Self {
            allow_diagonal,
            weight_by_move_cost: true,
            include_start: false,
            allow_occupied: false,
        }
    }

    /// Cells an ability can target: flat cost, orthogonal, origin included.
    #[must_use]
    pub const fn targeting(allow_occupied: bool) -> Self {
        Self {
            allow_diagonal: false,
            weight_by_move_cost: false,
            include_start: true,
            allow_occupied,
        }
    }
}

/// Range-query heap entry: cheapest cumulative cost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RangeNode {
    cost: u32,
    index: usize,
}

impl HeapItem for RangeNode {
    fn slot(&self) -> usize {
        self.index
    }
}

/// Every cell reachable from `start` within `distance` movement points.
///
/// Uniform-cost expansion, so a cell is included exactly when its cheapest
/// route fits the budget. Unwalkable cells (and occupied ones unless
/// allowed) are neither returned nor expanded. The origin is returned first
/// when `include_start` is set, regardless of its own occupancy; the rest
/// follow in order of increasing cost.
///
/// # Errors
///
/// [`GameError::NegativeDistance`] for a negative budget and
/// [`GameError::OutOfBounds`] for an origin outside the grid.
pub fn find_range(grid: &Grid, start: Coord, distance: i32, options: RangeOptions) -> Result<Vec<Coord>> {
    if distance < 0 {
        return Err(GameError::NegativeDistance(distance));
    }
    let start_index = require_in_bounds(grid, start)?;
    let budget = distance as u32;

    let mut best: Vec<Option<u32>> = vec![None; grid.cell_count()];
    let mut settled = vec![false; grid.cell_count()];
    let mut open = IndexedHeap::with_capacity(grid.cell_count());
    let mut cells = Vec::new();

    if options.include_start {
        cells.push(start);
    }
    best[start_index] = Some(0);
    open.push(RangeNode {
        cost: 0,
        index: start_index,
    });

    while let Ok(node) = open.pop_best() {
        settled[node.index] = true;
        let here = grid.coord_of(node.index);
        if node.index != start_index {
            cells.push(here);
        }

        for next in grid.neighbors(here, options.allow_diagonal) {
            let Some(next_index) = grid.index_of(next) else {
                continue;
            };
            if settled[next_index] {
                continue;
            }
            let cell = grid.cell(next_index);
            if !cell.walkable || (!options.allow_occupied && cell.occupant.is_some()) {
                continue;
            }

            let step = if options.weight_by_move_cost {
                cell.move_cost.saturating_add(1)
            } else {
                1
            };
            let cost = node.cost.saturating_add(step);
            if cost > budget || best[next_index].is_some_and(|known| known <= cost) {
                continue;
            }
            best[next_index] = Some(cost);

            let entry = RangeNode {
                cost,
                index: next_index,
            };
            if !open.update(entry) {
                open.push(entry);
            }
        }
    }

    trace!(%start, distance, found = cells.len(), "range query");
    Ok(cells)
}

/// Units standing within `distance` orthogonal steps of `start`.
///
/// Walks the 4-connected neighbourhood breadth-first at a flat cost of one
/// per step, through walls and units alike, so an area effect reaches
/// everything in its radius. The unit on `start` (if any) comes first,
/// followed by the others in visit order.
///
/// # Errors
///
/// [`GameError::NegativeDistance`] for a negative radius and
/// [`GameError::OutOfBounds`] for an origin outside the grid.
pub fn find_units_in_range(grid: &Grid, start: Coord, distance: i32) -> Result<Vec<UnitId>> {
    if distance < 0 {
        return Err(GameError::NegativeDistance(distance));
    }
    let start_index = require_in_bounds(grid, start)?;
    let radius = distance as u32;

    let mut visited: Vec<Option<u32>> = vec![None; grid.cell_count()];
    let mut frontier = VecDeque::from([start_index]);
    let mut units = Vec::new();
    visited[start_index] = Some(0);

    while let Some(index) = frontier.pop_front() {
        let cell = grid.cell(index);
        if let Some(unit) = cell.occupant {
            units.push(unit);
        }

        let steps = visited[index].unwrap_or(0);
        if steps == radius {
            continue;
        }
        for next in grid.neighbors(cell.coord, false) {
            let Some(next_index) = grid.index_of(next) else {
                continue;
            };
            if visited[next_index].is_none() {
                visited[next_index] = Some(steps + 1);
                frontier.push_back(next_index);
            }
        }
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TerrainKind;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    fn assert_contiguous(start: Coord, path: &[Coord], diagonal: bool) {
        let mut previous = start;
        for &step in path {
            assert!(
                previous.is_adjacent(step, diagonal),
                "{previous} -> {step} is not a single step"
            );
            previous = step;
        }
    }

    #[test]
    fn test_octile_distance() {
        assert_eq!(octile_distance(c(0, 0), c(3, 0), false), 30);
        assert_eq!(octile_distance(c(0, 0), c(3, 2), false), 50);
        assert_eq!(octile_distance(c(0, 0), c(3, 2), true), 2 * 14 + 10);
        assert_eq!(octile_distance(c(4, 4), c(4, 4), true), 0);
    }

    #[test]
    fn test_straight_path() {
        let grid = Grid::new(5, 1);
        let path = find_path(&grid, c(0, 0), c(4, 0), false, false).unwrap();
        assert_eq!(path, vec![c(1, 0), c(2, 0), c(3, 0), c(4, 0)]);
    }

    #[test]
    fn test_path_to_same_cell_is_empty() {
        let grid = Grid::new(4, 4);
        assert!(find_path(&grid, c(2, 2), c(2, 2), true, false).unwrap().is_empty());
    }

    #[test]
    fn test_path_around_wall() {
        let mut grid = Grid::new(7, 7);
        for y in 0..6 {
            grid.set_terrain(c(3, y), TerrainKind::Wall).unwrap();
        }

        let path = find_path(&grid, c(0, 0), c(6, 0), false, false).unwrap();
        assert_eq!(path.last(), Some(&c(6, 0)));
        assert!(path.iter().all(|&step| grid.is_walkable(step)));
        assert_contiguous(c(0, 0), &path, false);
        // Down to row 6, across, and back up.
        assert_eq!(path.len(), 6 + 6 + 6);
    }

    #[test]
    fn test_enclosed_goal_is_unreachable() {
        let mut grid = Grid::new(7, 7);
        for coord in grid.neighbors(c(5, 5), true) {
            grid.set_walkable(coord, false).unwrap();
        }
        assert!(find_path(&grid, c(0, 0), c(5, 5), true, false).unwrap().is_empty());
        assert!(find_path(&grid, c(0, 0), c(5, 5), false, true).unwrap().is_empty());
    }

    #[test]
    fn test_unwalkable_endpoints() {
        let mut grid = Grid::new(5, 5);
        grid.set_walkable(c(0, 0), false).unwrap();
        grid.set_walkable(c(4, 4), false).unwrap();
        assert!(find_path(&grid, c(0, 0), c(2, 2), false, false).unwrap().is_empty());
        assert!(find_path(&grid, c(2, 2), c(4, 4), false, false).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_bounds_is_an_error() {
        let grid = Grid::new(5, 5);
        assert!(matches!(
            find_path(&grid, c(0, 0), c(5, 0), false, false),
            Err(GameError::OutOfBounds { .. })
        ));
        assert!(find_path(&grid, c(-1, 0), c(1, 0), false, false).is_err());
    }

    #[test]
    fn test_occupied_cells_block_unless_passing_through() {
        let mut grid = Grid::new(3, 1);
        grid.place_unit(UnitId(1), c(1, 0)).unwrap();

        assert!(find_path(&grid, c(0, 0), c(2, 0), false, false).unwrap().is_empty());
        assert_eq!(
            find_path(&grid, c(0, 0), c(2, 0), false, true).unwrap(),
            vec![c(1, 0), c(2, 0)]
        );
    }

    #[test]
    fn test_occupied_end_cell_is_reachable() {
        let mut grid = Grid::new(4, 1);
        grid.place_unit(UnitId(1), c(0, 0)).unwrap();
        grid.place_unit(UnitId(2), c(3, 0)).unwrap();

        let path = find_path(&grid, c(0, 0), c(3, 0), false, false).unwrap();
        assert_eq!(path, vec![c(1, 0), c(2, 0), c(3, 0)]);
    }

    #[test]
    fn test_diagonal_path_length() {
        let grid = Grid::new(8, 8);
        let path = find_path(&grid, c(0, 0), c(5, 3), true, false).unwrap();
        assert_eq!(path.len(), 5);
        assert_contiguous(c(0, 0), &path, true);
    }

    #[test]
    fn test_expensive_cells_are_avoided() {
        let mut grid = Grid::new(5, 3);
        for x in 1..4 {
            grid.set_move_cost(c(x, 1), 9).unwrap();
        }

        let path = find_path(&grid, c(0, 1), c(4, 1), false, false).unwrap();
        assert_eq!(path.last(), Some(&c(4, 1)));
        assert!(path
            .iter()
            .all(|&step| grid.cell_at(step).unwrap().move_cost == 0));
    }

    #[test]
    fn test_determinism() {
        let mut grid = Grid::new(20, 20);
        for y in 5..15 {
            grid.set_terrain(c(10, y), TerrainKind::Wall).unwrap();
        }

        let first = find_path(&grid, c(5, 10), c(15, 10), true, false).unwrap();
        for _ in 0..3 {
            assert_eq!(find_path(&grid, c(5, 10), c(15, 10), true, false).unwrap(), first);
        }
    }

    #[test]
    fn test_path_movement_cost() {
        let grid = Grid::from_rows(&[".,^."]).unwrap();
        let path = find_path(&grid, c(0, 0), c(3, 0), false, false).unwrap();
        assert_eq!(path_movement_cost(&grid, &path), 2 + 3 + 1);
        assert_eq!(path_movement_cost(&grid, &[]), 0);
    }

    #[test]
    fn test_range_from_corner() {
        let grid = Grid::new(5, 5);
        let options = RangeOptions {
            include_start: true,
            ..RangeOptions::default()
        };
        let cells: BTreeSet<Coord> = find_range(&grid, c(0, 0), 3, options).unwrap().into_iter().collect();

        let expected: BTreeSet<Coord> = (0..5)
            .flat_map(|x| (0..5).map(move |y| c(x, y)))
            .filter(|&coord| coord.x + coord.y <= 3)
            .collect();
        assert_eq!(expected.len(), 10);
        assert_eq!(cells, expected);
    }

    #[test]
    fn test_range_zero_is_start_only() {
        let grid = Grid::new(5, 5);
        let options = RangeOptions {
            include_start: true,
            ..RangeOptions::default()
        };
        assert_eq!(find_range(&grid, c(2, 2), 0, options).unwrap(), vec![c(2, 2)]);
        assert!(find_range(&grid, c(2, 2), 0, RangeOptions::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_range_rejects_bad_input() {
        let grid = Grid::new(3, 3);
        assert_eq!(
            find_range(&grid, c(0, 0), -1, RangeOptions::default()),
            Err(GameError::NegativeDistance(-1))
        );
        assert!(find_range(&grid, c(3, 3), 1, RangeOptions::default()).is_err());
    }

    #[test]
    fn test_range_weighted_by_move_cost() {
        let grid = Grid::from_rows(&[".^..", "...."]).unwrap();
        let flat: BTreeSet<Coord> = find_range(&grid, c(0, 0), 2, RangeOptions::default())
            .unwrap()
            .into_iter()
            .collect();
        assert!(flat.contains(&c(2, 0)));

        let weighted: BTreeSet<Coord> = find_range(&grid, c(0, 0), 2, RangeOptions::movement(false))
            .unwrap()
            .into_iter()
            .collect();
        // The hill costs 3 on its own and is out of budget.
        assert!(!weighted.contains(&c(1, 0)));
        assert!(!weighted.contains(&c(2, 0)));
        assert!(weighted.contains(&c(1, 1)));
        assert!(weighted.contains(&c(0, 1)));
    }

    #[test]
    fn test_range_occupancy() {
        let mut grid = Grid::new(5, 1);
        grid.place_unit(UnitId(1), c(0, 0)).unwrap();
        grid.place_unit(UnitId(2), c(2, 0)).unwrap();

        let blocked = find_range(&grid, c(0, 0), 4, RangeOptions::movement(false)).unwrap();
        assert_eq!(blocked, vec![c(1, 0)]);

        let options = RangeOptions {
            allow_occupied: true,
            include_start: true,
            ..RangeOptions::default()
        };
        let open = find_range(&grid, c(0, 0), 4, options).unwrap();
        assert_eq!(open, vec![c(0, 0), c(1, 0), c(2, 0), c(3, 0), c(4, 0)]);
    }

    #[test]
    fn test_range_does_not_cross_walls() {
        let grid = Grid::from_rows(&["..#.."]).unwrap();
        let cells = find_range(&grid, c(0, 0), 10, RangeOptions::default()).unwrap();
        assert_eq!(cells, vec![c(1, 0)]);
    }

    #[test]
    fn test_units_in_range() {
        let mut grid = Grid::from_rows(&[".....", "..#..", "....."]).unwrap();
        grid.place_unit(UnitId(1), c(2, 0)).unwrap();
        grid.place_unit(UnitId(2), c(2, 2)).unwrap();
        grid.place_unit(UnitId(3), c(4, 2)).unwrap();

        // Area effects pass over the wall at (2, 1).
        let hit = find_units_in_range(&grid, c(2, 0), 2).unwrap();
        assert_eq!(hit, vec![UnitId(1), UnitId(2)]);

        let around_wall = find_units_in_range(&grid, c(2, 1), 1).unwrap();
        assert_eq!(around_wall, vec![UnitId(1), UnitId(2)]);

        assert!(find_units_in_range(&grid, c(0, 0), 1).unwrap().is_empty());
        assert_eq!(find_units_in_range(&grid, c(4, 2), 0).unwrap(), vec![UnitId(3)]);
        assert_eq!(
            find_units_in_range(&grid, c(0, 0), -2),
            Err(GameError::NegativeDistance(-2))
        );
    }

    proptest! {
        /// On an open grid the path is as short as the movement metric allows.
        #[test]
        fn prop_open_grid_paths_are_optimal(
            width in 1u32..12,
            height in 1u32..12,
            seed in any::<(u32, u32, u32, u32)>(),
            diagonal in any::<bool>(),
        ) {
            let grid = Grid::new(width, height);
            let start = c((seed.0 % width) as i32, (seed.1 % height) as i32);
            let end = c((seed.2 % width) as i32, (seed.3 % height) as i32);

            let path = find_path(&grid, start, end, diagonal, false).unwrap();
            let expected = if diagonal {
                start.chebyshev_distance(end)
            } else {
                start.manhattan_distance(end)
            };
            prop_assert_eq!(path.len() as u32, expected);
            if start != end {
                prop_assert_eq!(path.last().copied(), Some(end));
            }
            assert_contiguous(start, &path, diagonal);
        }

        /// Every cell of a flat range query is within the Manhattan budget.
        #[test]
        fn prop_flat_range_within_budget(
            size in 1u32..10,
            origin in any::<(u32, u32)>(),
            distance in 0i32..8,
        ) {
            let grid = Grid::new(size, size);
            let start = c((origin.0 % size) as i32, (origin.1 % size) as i32);
            let cells = find_range(&grid, start, distance, RangeOptions::default()).unwrap();
            let expected = grid
                .cells()
                .filter(|cell| cell.coord != start && cell.coord.manhattan_distance(start) <= distance as u32)
                .count();
            prop_assert_eq!(cells.len(), expected);
            prop_assert!(!cells.contains(&start));
        }
    }
}
