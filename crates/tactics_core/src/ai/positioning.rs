//! Where to stand when there is nothing better to do.
//!
//! Tried in order until one yields a cell:
//!
//! 1. Ranged units and casters retreat to the reachable cell farthest (by
//!    summed Manhattan distance) from every known hostile.
//! 2. Melee units close in on the weakest hostile they can reach.
//! 3. Otherwise they walk towards a random hostile along its path.
//! 4. As a last resort, any random reachable cell.
//!
//! Steps 2-3 only run when hostiles were seen. With none in sight a ranged
//! unit takes the first reachable cell, as every cell is equally safe. The
//! chain only comes up empty when the unit cannot move at all, is already
//! next to its prey, or is ranged and already standing on the safest cell.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use super::action::{OtherUnit, UnitScan};
use crate::grid::{Coord, Grid};
use crate::unit::Unit;

/// Pick a cell to move to, or `None` to stay put.
///
/// `reachable` is the actor's movement range, excluding its own cell.
pub fn find_point_to_move_to<R: Rng + ?Sized>(
    grid: &Grid,
    actor: &Unit,
    scan: &UnitScan<'_>,
    reachable: &[Coord],
    rng: &mut R,
) -> Option<Coord> {
    let &first = reachable.first()?;

    if actor.is_ranged_or_caster() {
        // With nobody in sight every cell is equally safe.
        let cell = if scan.hostile.is_empty() {
            first
        } else {
            safest_cell(actor.position, reachable, &scan.hostile)
        };
        trace!(unit = %actor.id, %cell, "retreating");
        return (cell != actor.position).then_some(cell);
    }

    if !scan.hostile.is_empty() {
        if let Some(approach) = approach_weakest(grid, actor, reachable, &scan.hostile) {
            return approach;
        }

        if let Some(cell) = advance_towards_random(actor, reachable, &scan.hostile, rng) {
            trace!(unit = %actor.id, %cell, "advancing");
            return Some(cell);
        }
    }

    reachable.choose(rng).copied()
}

/// The candidate cell with the greatest summed distance to all hostiles.
/// The current cell is a candidate too. Ties keep the first cell found.
fn safest_cell(current: Coord, reachable: &[Coord], hostiles: &[OtherUnit<'_>]) -> Coord {
    let score = |cell: Coord| -> u32 {
        hostiles
            .iter()
            .map(|hostile| cell.manhattan_distance(hostile.unit.position))
            .sum()
    };

    let mut best = current;
    let mut best_score = score(current);
    for &cell in reachable {
        let cell_score = score(cell);
        if cell_score > best_score {
            best = cell;
            best_score = cell_score;
        }
    }
    best
}

/// Move next to the lowest-health reachable hostile.
///
/// `None` if no hostile qualifies. `Some(None)` if one does but the actor
/// is already within attack range of it.
fn approach_weakest(
    grid: &Grid,
    actor: &Unit,
    reachable: &[Coord],
    hostiles: &[OtherUnit<'_>],
) -> Option<Option<Coord>> {
    let mut weakest: Option<(&OtherUnit<'_>, Coord)> = None;
    for hostile in hostiles.iter().filter(|hostile| hostile.reachable) {
        let health = hostile.unit.stats.current_health;
        if weakest.is_some_and(|(current, _)| current.unit.stats.current_health <= health) {
            continue;
        }
        let Some(cell) = approach_cell(actor.position, &hostile.path) else {
            continue;
        };
        let standable = cell == actor.position || reachable.contains(&cell);
        let free = grid
            .occupant(cell)
            .map_or(true, |occupant| occupant == actor.id);
        if standable && free {
            weakest = Some((hostile, cell));
        }
    }

    let (target, cell) = weakest?;
    if actor.position.manhattan_distance(target.unit.position) <= actor.stats.attack_range {
        trace!(unit = %actor.id, target = %target.unit.id, "already in range of weakest");
        return Some(None);
    }
    trace!(unit = %actor.id, target = %target.unit.id, %cell, "approaching weakest");
    Some(Some(cell))
}

/// The last cell before the target along a path. A one-step path means the
/// actor is already adjacent, so its own cell is the answer.
fn approach_cell(current: Coord, path: &[Coord]) -> Option<Coord> {
    match path.len() {
        0 => None,
        1 => Some(current),
        len => Some(path[len - 2]),
    }
}

/// Walk as far as movement allows along the path to a random hostile.
fn advance_towards_random<R: Rng + ?Sized>(
    actor: &Unit,
    reachable: &[Coord],
    hostiles: &[OtherUnit<'_>],
    rng: &mut R,
) -> Option<Coord> {
    let mut order: Vec<&OtherUnit<'_>> = hostiles.iter().collect();
    order.shuffle(rng);

    let movement = actor.stats.movement_distance as usize;
    order.into_iter().find_map(|hostile| {
        let furthest = movement.min(hostile.path.len()).checked_sub(1)?;
        hostile.path[..=furthest]
            .iter()
            .rev()
            .find(|cell| reachable.contains(cell))
            .copied()
    })
}
