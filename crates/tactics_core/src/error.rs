//! Error types for the tactics core.
//!
//! "Nothing found" is never an error here: an unreachable goal is an empty
//! path, an empty range is an empty `Vec`. Errors are reserved for bad input
//! at the boundary and for actions that conflict with the battle state.

use thiserror::Error;

use crate::grid::Coord;
use crate::unit::UnitId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all tactics core errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Coordinates outside the configured grid.
    #[error("Coordinates {coord} are outside the {width}x{height} grid")]
    OutOfBounds {
        /// Requested coordinates.
        coord: Coord,
        /// Grid width in cells.
        width: u32,
        /// Grid height in cells.
        height: u32,
    },

    /// A range query was asked for a negative distance.
    #[error("Distance must not be negative, got {0}")]
    NegativeDistance(i32),

    /// Scenario or configuration data is malformed.
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    /// A unit stat is outside its allowed range.
    #[error("Invalid stat for unit {unit}: {message}")]
    InvalidStat {
        /// Unit with the bad stat.
        unit: UnitId,
        /// What was wrong.
        message: String,
    },

    /// Unit identifier not present in the roster.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// The unit has already been removed from play.
    #[error("Unit {0} is dead")]
    UnitDead(UnitId),

    /// The target cell already holds a unit.
    #[error("Cell {0} is occupied")]
    CellOccupied(Coord),

    /// The target cell is not walkable.
    #[error("Cell {0} is not walkable")]
    CellBlocked(Coord),

    /// The unit already attacked or cast this turn.
    #[error("Unit {0} has already acted this turn")]
    AlreadyActed(UnitId),

    /// The unit already moved this turn.
    #[error("Unit {0} has already moved this turn")]
    AlreadyMoved(UnitId),

    /// Not enough mana to pay for an ability.
    #[error("Insufficient mana: need {required}, have {available}")]
    InsufficientMana {
        /// Mana cost of the ability.
        required: u32,
        /// Mana currently available.
        available: u32,
    },

    /// Ability index not present on the unit.
    #[error("Unit {unit} has no ability at slot {slot}")]
    UnknownAbility {
        /// Casting unit.
        unit: UnitId,
        /// Requested ability slot.
        slot: usize,
    },

    /// Target is outside the action's range.
    #[error("Target {target} is out of range ({distance} > {range})")]
    OutOfRange {
        /// Target cell.
        target: Coord,
        /// Grid distance to the target.
        distance: u32,
        /// Allowed range.
        range: u32,
    },

    /// No route exists to the requested destination.
    #[error("No path from {from} to {to}")]
    NoPath {
        /// Route start.
        from: Coord,
        /// Route destination.
        to: Coord,
    },

    /// An action was issued for a unit whose turn it is not.
    #[error("It is not unit {0}'s turn")]
    NotYourTurn(UnitId),

    /// The battle is not accepting this input in its current phase.
    #[error("Battle is not ready for this input: {0}")]
    WrongPhase(&'static str),

    /// The battle has already finished.
    #[error("Battle is over")]
    BattleOver,

    /// `pop_best` on an empty heap.
    #[error("Priority queue is empty")]
    EmptyQueue,

    /// The scheduler has no current turn to operate on.
    #[error("No active turn")]
    NoActiveTurn,

    /// Invalid internal state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
