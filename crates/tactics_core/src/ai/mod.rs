//! AI decision making for computer-controlled units.
//!
//! Each AI turn runs a fixed pipeline:
//!
//! 1. **Scan units** around the acting unit, with a path to each one.
//! 2. **Scan actions**: score every attack and ability use those units allow.
//! 3. **Rank and commit**: take the best-scoring candidate that still checks
//!    out, and add a move before it (to get in range) or after it (to
//!    reposition).
//!
//! With no feasible candidate the unit falls back to a positioning move,
//! see [`positioning`]. Random choices come from a seeded
//! [`ChaCha8Rng`], so a battle replays identically from the same seed.

pub mod action;
pub mod positioning;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::ability::{Ability, AbilityEffect};
use crate::error::Result;
use crate::grid::{Coord, Grid};
use crate::pathfinding::{find_path, find_range, RangeOptions};
use crate::unit::{Roster, Unit, UnitId};

pub use action::{AiAction, AiPlan, Candidate, OtherUnit, UnitScan};
pub use positioning::find_point_to_move_to;

/// Plans turns for AI-controlled units.
#[derive(Debug, Clone)]
pub struct AiDecisionEngine {
    rng: ChaCha8Rng,
}

impl AiDecisionEngine {
    /// Create an engine whose random choices follow `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Decide what `acting` does this turn.
    ///
    /// Never fails for lack of options: with nothing to attack or cast the
    /// plan is a positioning move, and with nowhere to go it is idle.
    pub fn decide(&mut self, grid: &Grid, roster: &Roster, acting: UnitId) -> Result<AiPlan> {
        let actor = roster.living(acting)?;
        let reachable = movement_range(grid, actor)?;
        let scan = scan_units(grid, roster, actor)?;
        let mut candidates = scan_actions(grid, actor, &scan);

        // Stable: equal scores keep scan order.
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        debug!(
            unit = %acting,
            friendly = scan.friendly.len(),
            hostile = scan.hostile.len(),
            candidates = candidates.len(),
            "AI scan complete"
        );

        let committed = candidates
            .iter()
            .find(|candidate| candidate.is_feasible(grid, actor, &reachable));

        let plan = match committed {
            Some(candidate) => {
                let reposition = if candidate.requires_movement() {
                    None
                } else {
                    find_point_to_move_to(grid, actor, &scan, &reachable, &mut self.rng)
                };
                debug!(unit = %acting, action = ?candidate.action, score = candidate.score, "AI committed");
                AiPlan::committed(candidate, reposition)
            }
            None => match find_point_to_move_to(grid, actor, &scan, &reachable, &mut self.rng) {
                Some(to) => {
                    debug!(unit = %acting, %to, "AI positioning only");
                    AiPlan::move_only(to)
                }
                None => {
                    debug!(unit = %acting, "AI idle");
                    AiPlan::idle()
                }
            },
        };
        Ok(plan)
    }
}

impl Default for AiDecisionEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Cells `unit` can walk to this turn, its own cell excluded.
pub fn movement_range(grid: &Grid, unit: &Unit) -> Result<Vec<Coord>> {
    find_range(
        grid,
        unit.position,
        unit.stats.movement_distance as i32,
        RangeOptions::movement(unit.stats.can_move_diagonally),
    )
}

/// How far around itself a unit looks for targets.
#[must_use]
pub fn scan_radius(unit: &Unit) -> u32 {
    let reach = unit.stats.attack_range.max(unit.max_ability_range());
    unit.stats.movement_distance.saturating_add(reach)
}

/// Snapshot every living unit within [`scan_radius`] of `actor`.
///
/// The actor itself is always the first friendly entry.
pub fn scan_units<'a>(grid: &Grid, roster: &'a Roster, actor: &'a Unit) -> Result<UnitScan<'a>> {
    let radius = scan_radius(actor);
    let mut scan = UnitScan {
        friendly: vec![OtherUnit::itself(actor)],
        hostile: Vec::new(),
    };

    for other in roster.alive().filter(|other| other.id != actor.id) {
        let distance = actor.position.manhattan_distance(other.position);
        if distance > radius {
            continue;
        }
        let path = find_path(
            grid,
            actor.position,
            other.position,
            actor.stats.can_move_diagonally,
            false,
        )?;
        let reachable = !path.is_empty() && path.len() as u32 <= actor.stats.movement_distance;
        let snapshot = OtherUnit {
            unit: other,
            distance,
            reachable,
            path,
        };
        if actor.is_friendly_to(other) {
            scan.friendly.push(snapshot);
        } else {
            scan.hostile.push(snapshot);
        }
    }
    Ok(scan)
}

/// Score every attack and ability use the scan allows, in scan order.
///
/// Candidates out of range get a `move_to` cell on the path towards the
/// target, as far back as the action's range allows. Abilities restricted
/// to empty cells are aimed at a free cell whose area still covers the
/// target, or skipped if there is none.
#[must_use]
pub fn scan_actions(grid: &Grid, actor: &Unit, scan: &UnitScan<'_>) -> Vec<Candidate> {
    let stats = &actor.stats;
    let mut candidates = Vec::new();

    for (slot, ability) in actor.abilities.iter().enumerate() {
        if ability.ai_ignore || ability.mana_cost > stats.current_mana {
            continue;
        }
        if let AbilityEffect::Empower { .. } = ability.effect {
            candidates.push(Candidate {
                action: AiAction::Cast {
                    ability: slot,
                    cell: actor.position,
                    target: actor.id,
                },
                score: ability.ai_score(),
                move_to: None,
                range: 0,
            });
        }
    }

    for hostile in &scan.hostile {
        let target = hostile.unit;

        if hostile.distance <= stats.movement_distance + stats.attack_range {
            let score = stats.attack_power as i32 - target.stats.defence as i32;
            let action = AiAction::Attack {
                target: target.id,
                cell: target.position,
            };
            push_candidate(&mut candidates, actor, hostile, action, score, stats.attack_range, stats.attack_range);
        }

        for (slot, ability) in actor.abilities.iter().enumerate() {
            if !ability.is_ai_offensive()
                || ability.is_self_cast()
                || ability.mana_cost > stats.current_mana
                || hostile.distance > stats.movement_distance + ability.range
            {
                continue;
            }
            let Some((cell, reach)) = aim_ability(grid, actor, ability, target) else {
                continue;
            };
            let score = ability.ai_score() + stats.intelligence as i32 - target.stats.resistance as i32;
            let action = AiAction::Cast {
                ability: slot,
                cell,
                target: target.id,
            };
            let pushed = candidates.len();
            push_candidate(&mut candidates, actor, hostile, action, score, ability.range, reach);
            // The blast must also miss the cell the caster moves to.
            let self_hit = candidates
                .get(pushed)
                .and_then(|candidate| candidate.move_to)
                .is_some_and(|stand| !ability.requires_target && stand.manhattan_distance(cell) <= ability.area_radius());
            if self_hit {
                candidates.truncate(pushed);
            }
        }
    }

    for ally in &scan.friendly {
        let target = ally.unit;
        for (slot, ability) in actor.abilities.iter().enumerate() {
            if !ability.is_ai_supportive()
                || matches!(ability.effect, AbilityEffect::Empower { .. })
                || ability.mana_cost > stats.current_mana
                || ally.distance > stats.movement_distance + ability.range
            {
                continue;
            }
            // Healing is only worth what the target is missing.
            let score = ability.ai_score().clamp(0, target.missing_health() as i32);
            if score == 0 {
                continue;
            }
            let Some((cell, reach)) = aim_ability(grid, actor, ability, target) else {
                continue;
            };
            let action = AiAction::Cast {
                ability: slot,
                cell,
                target: target.id,
            };
            push_candidate(&mut candidates, actor, ally, action, score, ability.range, reach);
        }
    }

    candidates
}

/// Cell to aim `ability` at so its area covers `target`, and how close to
/// the target the caster must stand for that cell to be in range.
fn aim_ability(grid: &Grid, actor: &Unit, ability: &Ability, target: &Unit) -> Option<(Coord, u32)> {
    if ability.requires_target {
        return Some((target.position, ability.range));
    }
    let radius = ability.area_radius();
    if radius == 0 || radius > ability.range {
        return None;
    }
    let centre = target.position;
    let spread = radius as i32;
    let mut best: Option<Coord> = None;
    for dy in -spread..=spread {
        for dx in -spread..=spread {
            let cell = Coord::new(centre.x + dx, centre.y + dy);
            if cell.manhattan_distance(centre) > radius || !grid.in_bounds(cell) || grid.occupant(cell).is_some() {
                continue;
            }
            // Harmful areas must not reach the caster.
            if ability.is_ai_offensive() && cell.manhattan_distance(actor.position) <= radius {
                continue;
            }
            let closer = best.map_or(true, |current| {
                cell.manhattan_distance(actor.position) < current.manhattan_distance(actor.position)
            });
            if closer {
                best = Some(cell);
            }
        }
    }
    best.map(|cell| (cell, ability.range - radius))
}

/// `reach` is how close the standing cell must get to the target unit;
/// it is below `range` when the action is aimed beside the target.
fn push_candidate(
    candidates: &mut Vec<Candidate>,
    actor: &Unit,
    target: &OtherUnit<'_>,
    action: AiAction,
    score: i32,
    range: u32,
    reach: u32,
) {
    let mut candidate = Candidate {
        action,
        score,
        move_to: None,
        range,
    };
    let aimed_at = candidate.target_cell();
    if actor.position.manhattan_distance(aimed_at) > range {
        match target.stand_off_cell(reach) {
            Some(cell) if cell != aimed_at => candidate.move_to = Some(cell),
            _ => return,
        }
    }
    candidates.push(candidate);
}
