//! Battle grid: cell storage, occupancy and neighbour queries.
//!
//! The grid owns no search logic. Pathfinding and range queries live in
//! [`crate::pathfinding`] and keep their scratch state in query-local
//! tables, so a `&Grid` can be shared by any number of concurrent queries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{height_serde, height_tenths, Fixed};
use crate::unit::UnitId;

/// Integer grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Coord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Coord {
    /// Create a new coordinate pair.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// `|dx| + |dy|`, the distance used for every range check in the game.
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// `max(|dx|, |dy|)`, the step count of an 8-connected walk.
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// True if `other` is one orthogonal (or, with `diagonal`, one diagonal) step away.
    #[must_use]
    pub fn is_adjacent(self, other: Self, diagonal: bool) -> bool {
        if diagonal {
            self != other && self.chebyshev_distance(other) == 1
        } else {
            self.manhattan_distance(other) == 1
        }
    }

    const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Manhattan distance between two cells.
#[must_use]
pub const fn manhattan_distance(a: Coord, b: Coord) -> u32 {
    a.manhattan_distance(b)
}

/// Orthogonal steps, in scan order: north, south, east, west.
const ORTHOGONAL: [(i32, i32); 4] = [(0, -1), (0, 1), (1, 0), (-1, 0)];

/// Diagonal steps, scanned after the orthogonal ones: NE, NW, SE, SW.
const DIAGONAL: [(i32, i32); 4] = [(1, -1), (-1, -1), (1, 1), (-1, 1)];

/// Terrain kinds. Each supplies default walkability, extra move cost and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Open ground.
    #[default]
    Plain,
    /// Brush and mud, one extra movement point.
    Rough,
    /// Raised ground, two extra movement points.
    Hill,
    /// Impassable wall or rock.
    Wall,
    /// Impassable water.
    Water,
}

impl TerrainKind {
    /// Parse a terrain symbol from a scenario map row.
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(Self::Plain),
            ',' => Some(Self::Rough),
            '^' => Some(Self::Hill),
            '#' => Some(Self::Wall),
            '~' => Some(Self::Water),
            _ => None,
        }
    }

    /// Symbol used in scenario map rows.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Plain => '.',
            Self::Rough => ',',
            Self::Hill => '^',
            Self::Wall => '#',
            Self::Water => '~',
        }
    }

    /// Whether units can stand on this terrain.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Wall | Self::Water)
    }

    /// Movement cost on top of the baseline step.
    #[must_use]
    pub const fn move_cost(self) -> u32 {
        match self {
            Self::Plain | Self::Wall | Self::Water => 0,
            Self::Rough => 1,
            Self::Hill => 2,
        }
    }

    /// Cosmetic height of the tile surface.
    #[must_use]
    pub fn height(self) -> Fixed {
        match self {
            Self::Water => height_tenths(5),
            Self::Plain | Self::Rough => height_tenths(10),
            Self::Hill => height_tenths(15),
            Self::Wall => height_tenths(20),
        }
    }
}

/// One tile of the battle grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Position of this cell.
    pub coord: Coord,
    /// Terrain the cell was built from.
    pub terrain: TerrainKind,
    /// Whether units can enter the cell.
    pub walkable: bool,
    /// Extra movement cost beyond the baseline step.
    pub move_cost: u32,
    /// Unit standing on the cell.
    pub occupant: Option<UnitId>,
    /// Cosmetic height, passed through untouched.
    #[serde(with = "height_serde")]
    pub height: Fixed,
}

impl Cell {
    fn new(coord: Coord, terrain: TerrainKind) -> Self {
        Self {
            coord,
            terrain,
            walkable: terrain.is_walkable(),
            move_cost: terrain.move_cost(),
            occupant: None,
            height: terrain.height(),
        }
    }

    /// Walkable and nobody standing here.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.walkable && self.occupant.is_none()
    }
}

/// Fixed-size battle grid stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a grid with every cell plain and walkable.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "Grid width must be positive");
        assert!(height > 0, "Grid height must be positive");

        let cells = (0..height as i32)
            .flat_map(|y| (0..width as i32).map(move |x| Cell::new(Coord::new(x, y), TerrainKind::Plain)))
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    /// Build a grid from map rows using the [`TerrainKind`] symbol legend.
    ///
    /// Row 0 is `y == 0`. Every row must have the same length.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().chars().count());
        if width == 0 || height == 0 {
            return Err(GameError::InvalidScenario("map has no cells".into()));
        }

        let mut grid = Self::new(width as u32, height as u32);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width {
                return Err(GameError::InvalidScenario(format!(
                    "map row {y} has {} cells, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, symbol) in row.chars().enumerate() {
                let terrain = TerrainKind::from_symbol(symbol).ok_or_else(|| {
                    GameError::InvalidScenario(format!("unknown terrain symbol '{symbol}' at ({x}, {y})"))
                })?;
                grid.set_terrain(Coord::new(x as i32, y as i32), terrain)?;
            }
        }
        Ok(grid)
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if coordinates are within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.y >= 0 && (coord.x as u32) < self.width && (coord.y as u32) < self.height
    }

    /// Row-major index of a coordinate, `None` if out of bounds.
    #[inline]
    #[must_use]
    pub fn index_of(&self, coord: Coord) -> Option<usize> {
        self.in_bounds(coord)
            .then(|| (coord.y as usize) * (self.width as usize) + (coord.x as usize))
    }

    /// Coordinate of a row-major index.
    #[inline]
    #[must_use]
    pub fn coord_of(&self, index: usize) -> Coord {
        let width = self.width as usize;
        Coord::new((index % width) as i32, (index / width) as i32)
    }

    fn checked_index(&self, coord: Coord) -> Result<usize> {
        self.index_of(coord).ok_or(GameError::OutOfBounds {
            coord,
            width: self.width,
            height: self.height,
        })
    }

    /// Cell at the given coordinates.
    pub fn cell_at(&self, coord: Coord) -> Result<&Cell> {
        let index = self.checked_index(coord)?;
        Ok(&self.cells[index])
    }

    /// Mutable cell at the given coordinates.
    pub fn cell_at_mut(&mut self, coord: Coord) -> Result<&mut Cell> {
        let index = self.checked_index(coord)?;
        Ok(&mut self.cells[index])
    }

    /// Cell by row-major index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= cell_count()`.
    #[inline]
    #[must_use]
    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    /// Iterate all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Replace a cell's terrain, resetting walkability, cost and height.
    ///
    /// The occupant is kept; placing a wall under a unit is the caller's problem.
    pub fn set_terrain(&mut self, coord: Coord, terrain: TerrainKind) -> Result<()> {
        let cell = self.cell_at_mut(coord)?;
        cell.terrain = terrain;
        cell.walkable = terrain.is_walkable();
        cell.move_cost = terrain.move_cost();
        cell.height = terrain.height();
        Ok(())
    }

    /// Override walkability of a single cell.
    pub fn set_walkable(&mut self, coord: Coord, walkable: bool) -> Result<()> {
        self.cell_at_mut(coord)?.walkable = walkable;
        Ok(())
    }

    /// Override the extra movement cost of a single cell.
    pub fn set_move_cost(&mut self, coord: Coord, move_cost: u32) -> Result<()> {
        self.cell_at_mut(coord)?.move_cost = move_cost;
        Ok(())
    }

    /// True if in bounds and walkable.
    #[must_use]
    pub fn is_walkable(&self, coord: Coord) -> bool {
        self.cell_at(coord).is_ok_and(|cell| cell.walkable)
    }

    /// True if in bounds, walkable and unoccupied.
    #[must_use]
    pub fn is_free(&self, coord: Coord) -> bool {
        self.cell_at(coord).is_ok_and(Cell::is_free)
    }

    /// Unit standing on a cell, if any.
    #[must_use]
    pub fn occupant(&self, coord: Coord) -> Option<UnitId> {
        self.cell_at(coord).ok().and_then(|cell| cell.occupant)
    }

    /// In-bounds neighbours of a cell in fixed scan order.
    ///
    /// Orthogonal neighbours come first (N, S, E, W), followed by the
    /// diagonals (NE, NW, SE, SW) when `diagonal` is set. Out-of-bounds
    /// input yields no neighbours.
    #[must_use]
    pub fn neighbors(&self, coord: Coord, diagonal: bool) -> Vec<Coord> {
        if !self.in_bounds(coord) {
            return Vec::new();
        }
        let extra: &[(i32, i32)] = if diagonal { &DIAGONAL } else { &[] };
        ORTHOGONAL
            .iter()
            .chain(extra)
            .map(|&(dx, dy)| coord.offset(dx, dy))
            .filter(|&next| self.in_bounds(next))
            .collect()
    }

    /// Put a unit on an empty walkable cell.
    pub fn place_unit(&mut self, unit: UnitId, coord: Coord) -> Result<()> {
        let cell = self.cell_at_mut(coord)?;
        if !cell.walkable {
            return Err(GameError::CellBlocked(coord));
        }
        if cell.occupant.is_some() {
            return Err(GameError::CellOccupied(coord));
        }
        cell.occupant = Some(unit);
        Ok(())
    }

    /// Move whatever stands on `from` to `to`, returning the moved unit.
    pub fn move_unit(&mut self, from: Coord, to: Coord) -> Result<UnitId> {
        if from == to {
            return self
                .occupant(from)
                .ok_or_else(|| GameError::InvalidState(format!("no unit on {from}")));
        }
        let unit = self
            .cell_at(from)?
            .occupant
            .ok_or_else(|| GameError::InvalidState(format!("no unit on {from}")))?;
        self.place_unit(unit, to)?;
        self.cell_at_mut(from)?.occupant = None;
        Ok(unit)
    }

    /// Empty a cell, returning the unit that stood there.
    pub fn clear_cell(&mut self, coord: Coord) -> Option<UnitId> {
        self.cell_at_mut(coord).ok().and_then(|cell| cell.occupant.take())
    }

    /// Closest free cell to `coord`.
    ///
    /// Checks the 8 neighbours in scan order first, then falls back to the
    /// first free cell in row-major order. `None` only if the grid is full.
    #[must_use]
    pub fn free_cell_near(&self, coord: Coord) -> Option<Coord> {
        self.neighbors(coord, true)
            .into_iter()
            .find(|&next| self.is_free(next))
            .or_else(|| self.cells.iter().find(|cell| cell.is_free()).map(|cell| cell.coord))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10, 6);
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 6);
        assert_eq!(grid.cell_count(), 60);
        assert!(grid.cells().all(Cell::is_free));
    }

    #[test]
    fn test_cell_at_out_of_bounds() {
        let grid = Grid::new(5, 5);
        assert!(grid.cell_at(Coord::new(4, 4)).is_ok());
        assert_eq!(
            grid.cell_at(Coord::new(5, 0)),
            Err(GameError::OutOfBounds {
                coord: Coord::new(5, 0),
                width: 5,
                height: 5
            })
        );
        assert!(grid.cell_at(Coord::new(-1, 2)).is_err());
    }

    #[test]
    fn test_index_round_trip() {
        let grid = Grid::new(7, 3);
        let coord = Coord::new(5, 2);
        let index = grid.index_of(coord).unwrap();
        assert_eq!(index, 19);
        assert_eq!(grid.coord_of(index), coord);
    }

    #[test]
    fn test_neighbors_order_and_clipping() {
        let grid = Grid::new(5, 5);

        let center = grid.neighbors(Coord::new(2, 2), false);
        assert_eq!(
            center,
            vec![Coord::new(2, 1), Coord::new(2, 3), Coord::new(3, 2), Coord::new(1, 2)]
        );

        let corner = grid.neighbors(Coord::new(0, 0), true);
        assert_eq!(corner, vec![Coord::new(0, 1), Coord::new(1, 0), Coord::new(1, 1)]);

        assert_eq!(grid.neighbors(Coord::new(2, 2), true).len(), 8);
        assert!(grid.neighbors(Coord::new(9, 9), true).is_empty());
    }

    #[test]
    fn test_distances() {
        let a = Coord::new(1, 1);
        let b = Coord::new(4, 3);
        assert_eq!(manhattan_distance(a, b), 5);
        assert_eq!(a.chebyshev_distance(b), 3);
        assert!(a.is_adjacent(Coord::new(2, 2), true));
        assert!(!a.is_adjacent(Coord::new(2, 2), false));
        assert!(!a.is_adjacent(a, true));
    }

    #[test]
    fn test_from_rows() {
        let grid = Grid::from_rows(&["..#", ",^~"]).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert!(!grid.is_walkable(Coord::new(2, 0)));
        assert!(!grid.is_walkable(Coord::new(2, 1)));
        assert_eq!(grid.cell_at(Coord::new(0, 1)).unwrap().move_cost, 1);
        assert_eq!(grid.cell_at(Coord::new(1, 1)).unwrap().move_cost, 2);
        assert_eq!(grid.cell_at(Coord::new(1, 1)).unwrap().height, height_tenths(15));
    }

    #[test]
    fn test_from_rows_rejects_bad_input() {
        assert!(Grid::from_rows(&["...", ".."]).is_err());
        assert!(Grid::from_rows(&["..x"]).is_err());
        assert!(Grid::from_rows::<&str>(&[]).is_err());
    }

    #[test]
    fn test_occupancy() {
        let mut grid = Grid::new(4, 4);
        let unit = UnitId(7);
        grid.set_walkable(Coord::new(3, 3), false).unwrap();

        grid.place_unit(unit, Coord::new(1, 1)).unwrap();
        assert_eq!(grid.occupant(Coord::new(1, 1)), Some(unit));
        assert_eq!(
            grid.place_unit(UnitId(8), Coord::new(1, 1)),
            Err(GameError::CellOccupied(Coord::new(1, 1)))
        );
        assert_eq!(
            grid.place_unit(UnitId(8), Coord::new(3, 3)),
            Err(GameError::CellBlocked(Coord::new(3, 3)))
        );

        assert_eq!(grid.move_unit(Coord::new(1, 1), Coord::new(2, 1)), Ok(unit));
        assert_eq!(grid.occupant(Coord::new(1, 1)), None);
        assert_eq!(grid.occupant(Coord::new(2, 1)), Some(unit));

        assert_eq!(grid.clear_cell(Coord::new(2, 1)), Some(unit));
        assert!(grid.is_free(Coord::new(2, 1)));
    }

    #[test]
    fn test_free_cell_near() {
        let mut grid = Grid::new(3, 3);
        for coord in grid.neighbors(Coord::new(1, 1), true) {
            grid.set_walkable(coord, false).unwrap();
        }
        grid.set_walkable(Coord::new(2, 2), true).unwrap();
        assert_eq!(grid.free_cell_near(Coord::new(1, 1)), Some(Coord::new(2, 2)));

        grid.place_unit(UnitId(1), Coord::new(2, 2)).unwrap();
        // Only the centre itself is left.
        assert_eq!(grid.free_cell_near(Coord::new(1, 1)), Some(Coord::new(1, 1)));
    }
}
