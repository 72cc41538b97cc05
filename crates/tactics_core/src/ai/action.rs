//! Candidate actions and the plans built from them.

use serde::{Deserialize, Serialize};

use crate::grid::{Coord, Grid};
use crate::pathfinding::find_path;
use crate::unit::{Unit, UnitId};

/// Snapshot of another unit taken at the start of an AI turn.
#[derive(Debug, Clone)]
pub struct OtherUnit<'a> {
    /// The unit as it stood when scanned.
    pub unit: &'a Unit,
    /// Manhattan distance from the acting unit.
    pub distance: u32,
    /// A path exists and is no longer than the acting unit's movement.
    pub reachable: bool,
    /// Path from the acting unit to this unit's cell; empty if none.
    pub path: Vec<Coord>,
}

impl<'a> OtherUnit<'a> {
    /// Snapshot of the acting unit itself.
    #[must_use]
    pub fn itself(unit: &'a Unit) -> Self {
        Self {
            unit,
            distance: 0,
            reachable: true,
            path: Vec::new(),
        }
    }

    /// Cell to stand on to end up `range` steps short of this unit along
    /// its path. `None` without a path.
    #[must_use]
    pub fn stand_off_cell(&self, range: u32) -> Option<Coord> {
        let last = self.path.len().checked_sub(1)?;
        let index = last.saturating_sub(range as usize);
        self.path.get(index).copied()
    }
}

/// Units seen by the acting unit this turn, split by side.
#[derive(Debug, Clone, Default)]
pub struct UnitScan<'a> {
    /// Same faction, including the acting unit itself.
    pub friendly: Vec<OtherUnit<'a>>,
    /// Every other faction.
    pub hostile: Vec<OtherUnit<'a>>,
}

/// One action the AI can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiAction {
    /// Basic attack on the unit standing on `cell`.
    Attack {
        /// Unit being attacked.
        target: UnitId,
        /// Cell the target stands on.
        cell: Coord,
    },
    /// Cast an ability on a cell.
    Cast {
        /// Ability slot on the caster.
        ability: usize,
        /// Cell the ability is aimed at.
        cell: Coord,
        /// Unit the cast was chosen for.
        target: UnitId,
    },
    /// Walk to a cell.
    Move {
        /// Destination cell.
        to: Coord,
    },
}

/// A scored hypothetical action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// What to do once in position.
    pub action: AiAction,
    /// Heuristic value; higher is better.
    pub score: i32,
    /// Where to walk first, if the target is not in range yet.
    pub move_to: Option<Coord>,
    /// Reach of the action from the standing cell.
    pub range: u32,
}

impl Candidate {
    /// True if the unit must walk before acting.
    #[must_use]
    pub const fn requires_movement(&self) -> bool {
        self.move_to.is_some()
    }

    /// Cell the action is aimed at.
    #[must_use]
    pub const fn target_cell(&self) -> Coord {
        match self.action {
            AiAction::Attack { cell, .. } | AiAction::Cast { cell, .. } => cell,
            AiAction::Move { to } => to,
        }
    }

    /// Check the candidate can still be carried out by `actor`.
    ///
    /// A required move must lead to a cell in `reachable` (the actor's
    /// movement range, which excludes occupied cells) with a path to it,
    /// and the standing cell must be within range of the target.
    #[must_use]
    pub fn is_feasible(&self, grid: &Grid, actor: &Unit, reachable: &[Coord]) -> bool {
        let standing = match self.move_to {
            Some(cell) if cell != actor.position => {
                if !reachable.contains(&cell) {
                    return false;
                }
                let path = find_path(grid, actor.position, cell, actor.stats.can_move_diagonally, false);
                if !path.is_ok_and(|path| !path.is_empty()) {
                    return false;
                }
                cell
            }
            _ => actor.position,
        };
        standing.manhattan_distance(self.target_cell()) <= self.range
    }
}

/// The actions an AI unit will take this turn, in order. At most two.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiPlan {
    steps: Vec<AiAction>,
    /// Score of the committed action, if one was chosen.
    pub score: Option<i32>,
}

impl AiPlan {
    /// A plan that does nothing.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// A plan consisting only of a move.
    #[must_use]
    pub fn move_only(to: Coord) -> Self {
        Self {
            steps: vec![AiAction::Move { to }],
            score: None,
        }
    }

    /// A committed candidate, plus an optional repositioning move after it.
    #[must_use]
    pub fn committed(candidate: &Candidate, reposition: Option<Coord>) -> Self {
        let steps = match candidate.move_to {
            Some(to) => vec![AiAction::Move { to }, candidate.action],
            None => std::iter::once(candidate.action)
                .chain(reposition.map(|to| AiAction::Move { to }))
                .collect(),
        };
        Self {
            steps,
            score: Some(candidate.score),
        }
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[AiAction] {
        &self.steps
    }

    /// True if the unit does nothing.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.steps.is_empty()
    }
}
