//! # Tactics Core
//!
//! Deterministic core of a turn-based tactical combat game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (the AI draws from a seeded ChaCha stream)
//! - No floating-point math
//!
//! This separation enables:
//! - Headless battle runs and batch balancing
//! - Replaying a battle from its scenario and seed
//! - Testing every algorithm without a game engine
//!
//! ## Crate Structure
//!
//! - [`grid`] - Cells, terrain and occupancy
//! - [`heap`] - Indexed binary heap with in-place priority updates
//! - [`pathfinding`] - A* paths and cost-bounded range queries
//! - [`scheduler`] - Speed-driven turn queue
//! - [`ai`] - Candidate scoring and positioning for AI units
//! - [`combat`] - Attack and ability resolution
//! - [`battle`] - Turn flow, player commands and outbound events
//! - [`scenario`] - RON scenario and configuration data

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ability;
pub mod ai;
pub mod battle;
pub mod combat;
pub mod error;
pub mod grid;
pub mod heap;
pub mod math;
pub mod pathfinding;
pub mod scenario;
pub mod scheduler;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ability::{Ability, AbilityEffect};
    pub use crate::ai::{AiAction, AiDecisionEngine, AiPlan};
    pub use crate::battle::{Battle, BattleEvent, BattlePhase, PlayerAction, RangePurpose};
    pub use crate::combat::CombatEffect;
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{Cell, Coord, Grid, TerrainKind};
    pub use crate::math::Fixed;
    pub use crate::pathfinding::{find_path, find_range, find_units_in_range, RangeOptions};
    pub use crate::scenario::{BattleConfig, ScenarioData, TurnCosts, UnitData};
    pub use crate::scheduler::{TurnEntry, TurnKind, TurnScheduler, READY_THRESHOLD};
    pub use crate::unit::{Controller, FactionId, HealthChange, Roster, Unit, UnitId, UnitStats};
}
