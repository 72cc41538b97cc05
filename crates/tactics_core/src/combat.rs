//! Combat resolution.
//!
//! Damage is deterministic: a basic attack deals the attacker's attack
//! power, an ability deals its listed amount. There is no hit chance and no
//! mitigation. Defence and resistance only steer the AI's choices.
//!
//! The resolver only touches unit stats. Deaths are reported as
//! [`HealthChange::Killed`] effects; clearing the grid and the scheduler is
//! up to the caller.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ability::{Ability, AbilityEffect};
use crate::error::{GameError, Result};
use crate::grid::{Coord, Grid};
use crate::pathfinding::find_units_in_range;
use crate::unit::{HealthChange, Roster, UnitId};

/// A single change caused by an attack or ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEffect {
    /// A unit's health changed.
    Health {
        /// Affected unit.
        unit: UnitId,
        /// What happened to its health.
        change: HealthChange,
    },
    /// A unit's attack power went up.
    AttackRaised {
        /// Affected unit.
        unit: UnitId,
        /// Amount gained.
        amount: u32,
    },
}

impl CombatEffect {
    /// The unit this effect killed, if any.
    #[must_use]
    pub const fn killed(&self) -> Option<UnitId> {
        match *self {
            Self::Health {
                unit,
                change: HealthChange::Killed(_),
            } => Some(unit),
            _ => None,
        }
    }
}

/// Apply a signed health change to a living unit.
///
/// Positive amounts damage, negative amounts heal. Dead or missing units
/// are skipped, so a unit caught twice by one area effect cannot die twice.
pub fn apply_health_change(roster: &mut Roster, unit: UnitId, amount: i32) -> Option<CombatEffect> {
    let target = roster.living_mut(unit).ok()?;
    let change = target.apply_health_change(amount);
    match change {
        HealthChange::Killed(dealt) => info!(unit = %unit, dealt, "unit killed"),
        HealthChange::Damaged(dealt) => debug!(unit = %unit, dealt, "unit damaged"),
        HealthChange::Healed(healed) => debug!(unit = %unit, healed, "unit healed"),
    }
    Some(CombatEffect::Health { unit, change })
}

/// Basic attack from `attacker` on whatever stands on `target_cell`.
///
/// Attacking an empty cell is allowed and does nothing. Range checks are
/// the caller's business.
pub fn apply_attack(grid: &Grid, roster: &mut Roster, attacker: UnitId, target_cell: Coord) -> Result<Vec<CombatEffect>> {
    let attack_power = roster.living(attacker)?.stats.attack_power;
    let Some(target) = grid.cell_at(target_cell)?.occupant else {
        debug!(unit = %attacker, cell = %target_cell, "attack on empty cell");
        return Ok(Vec::new());
    };
    debug!(unit = %attacker, target = %target, attack_power, "attack");
    Ok(apply_health_change(roster, target, attack_power as i32).into_iter().collect())
}

/// Pay an ability's costs: mana first, then health through the damage path.
///
/// Fails without any change when mana is short.
pub fn pay_ability_cost(roster: &mut Roster, caster: UnitId, ability: &Ability) -> Result<Vec<CombatEffect>> {
    roster.living_mut(caster)?.spend_mana(ability.mana_cost)?;
    if ability.health_cost == 0 {
        return Ok(Vec::new());
    }
    Ok(apply_health_change(roster, caster, ability.health_cost as i32)
        .into_iter()
        .collect())
}

/// Apply an ability's effect to a set of units.
///
/// [`AbilityEffect::Strike`] hits every listed unit. [`AbilityEffect::Empower`]
/// ignores the list and affects only the caster.
pub fn apply_ability(roster: &mut Roster, caster: UnitId, ability: &Ability, affected: &[UnitId]) -> Vec<CombatEffect> {
    match ability.effect {
        AbilityEffect::Strike { amount } => affected
            .iter()
            .filter_map(|&unit| apply_health_change(roster, unit, amount))
            .collect(),
        AbilityEffect::Empower { amount, attack_bonus } => {
            let mut effects = Vec::new();
            if let Ok(unit) = roster.living_mut(caster) {
                unit.stats.attack_power = unit.stats.attack_power.saturating_add(attack_bonus);
                if attack_bonus > 0 {
                    effects.push(CombatEffect::AttackRaised {
                        unit: caster,
                        amount: attack_bonus,
                    });
                }
            }
            if amount != 0 {
                effects.extend(apply_health_change(roster, caster, amount));
            }
            effects
        }
    }
}

/// Resolve an ability aimed at `target_cell`: collect the units in its area
/// and apply the effect to them.
///
/// Casts whose caster died in the meantime fizzle with no effect.
pub fn resolve_ability(
    grid: &Grid,
    roster: &mut Roster,
    caster: UnitId,
    ability: &Ability,
    target_cell: Coord,
) -> Result<Vec<CombatEffect>> {
    match roster.living(caster) {
        Ok(_) => {}
        Err(GameError::UnitDead(_)) => return Ok(Vec::new()),
        Err(err) => return Err(err),
    }
    let affected = find_units_in_range(grid, target_cell, ability.area_radius() as i32)?;
    debug!(
        unit = %caster,
        ability = %ability.name,
        cell = %target_cell,
        affected = affected.len(),
        "ability resolved"
    );
    Ok(apply_ability(roster, caster, ability, &affected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{Controller, FactionId, Unit};

    fn setup(positions: &[(i32, i32)]) -> (Grid, Roster, Vec<UnitId>) {
        let mut grid = Grid::new(6, 6);
        let mut roster = Roster::new();
        let ids = positions
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                let unit = Unit::new("Unit", FactionId(i as u8 % 2), Controller::Ai, Coord::new(x, y));
                let id = roster.insert(unit);
                grid.place_unit(id, Coord::new(x, y)).unwrap();
                id
            })
            .collect();
        (grid, roster, ids)
    }

    fn health(roster: &Roster, unit: UnitId) -> u32 {
        roster.get(unit).unwrap().stats.current_health
    }

    #[test]
    fn test_attack_deals_attack_power() {
        let (grid, mut roster, ids) = setup(&[(0, 0), (1, 0)]);
        let effects = apply_attack(&grid, &mut roster, ids[0], Coord::new(1, 0)).unwrap();
        assert_eq!(
            effects,
            vec![CombatEffect::Health {
                unit: ids[1],
                change: HealthChange::Damaged(15)
            }]
        );
        assert_eq!(health(&roster, ids[1]), 85);
    }

    #[test]
    fn test_attack_on_empty_cell() {
        let (grid, mut roster, ids) = setup(&[(0, 0)]);
        assert!(apply_attack(&grid, &mut roster, ids[0], Coord::new(3, 3)).unwrap().is_empty());
        assert!(apply_attack(&grid, &mut roster, ids[0], Coord::new(9, 9)).is_err());
    }

    #[test]
    fn test_lethal_attack_reports_kill() {
        let (grid, mut roster, ids) = setup(&[(0, 0), (1, 0)]);
        roster.get_mut(ids[0]).unwrap().stats.attack_power = 500;
        let effects = apply_attack(&grid, &mut roster, ids[0], Coord::new(1, 0)).unwrap();
        assert_eq!(effects[0].killed(), Some(ids[1]));
        assert!(!roster.get(ids[1]).unwrap().is_alive());

        // A dead attacker cannot act.
        roster.get_mut(ids[0]).unwrap().apply_health_change(1_000);
        assert_eq!(
            apply_attack(&grid, &mut roster, ids[0], Coord::new(1, 0)),
            Err(GameError::UnitDead(ids[0]))
        );
    }

    #[test]
    fn test_area_strike() {
        let (grid, mut roster, ids) = setup(&[(0, 0), (2, 2), (3, 2), (5, 5)]);
        let quake = Ability::strike("Quake", 30).with_area(2);
        let effects = resolve_ability(&grid, &mut roster, ids[0], &quake, Coord::new(2, 2)).unwrap();
        assert_eq!(effects.len(), 2);
        assert_eq!(health(&roster, ids[1]), 70);
        assert_eq!(health(&roster, ids[2]), 70);
        assert_eq!(health(&roster, ids[3]), 100);
        assert_eq!(health(&roster, ids[0]), 100);
    }

    #[test]
    fn test_heal_is_capped() {
        let (grid, mut roster, ids) = setup(&[(0, 0), (1, 0)]);
        roster.get_mut(ids[1]).unwrap().stats.current_health = 90;
        let mend = Ability::strike("Mend", -50).with_range(2);
        let effects = resolve_ability(&grid, &mut roster, ids[0], &mend, Coord::new(1, 0)).unwrap();
        assert_eq!(
            effects,
            vec![CombatEffect::Health {
                unit: ids[1],
                change: HealthChange::Healed(10)
            }]
        );
        assert_eq!(health(&roster, ids[1]), 100);
    }

    #[test]
    fn test_empower_buffs_caster() {
        let (grid, mut roster, ids) = setup(&[(0, 0), (1, 0)]);
        let rage = Ability::empower("Blood Rage", 10, 6);
        let effects = resolve_ability(&grid, &mut roster, ids[0], &rage, Coord::new(1, 0)).unwrap();
        assert_eq!(
            effects,
            vec![
                CombatEffect::AttackRaised { unit: ids[0], amount: 6 },
                CombatEffect::Health {
                    unit: ids[0],
                    change: HealthChange::Damaged(10)
                },
            ]
        );
        assert_eq!(roster.get(ids[0]).unwrap().stats.attack_power, 21);
        assert_eq!(health(&roster, ids[1]), 100);
    }

    #[test]
    fn test_cast_from_dead_caster_fizzles() {
        let (grid, mut roster, ids) = setup(&[(0, 0), (1, 0)]);
        roster.get_mut(ids[0]).unwrap().apply_health_change(1_000);
        let bolt = Ability::strike("Bolt", 10).with_range(2);
        assert!(resolve_ability(&grid, &mut roster, ids[0], &bolt, Coord::new(1, 0))
            .unwrap()
            .is_empty());
        assert_eq!(health(&roster, ids[1]), 100);
    }

    #[test]
    fn test_pay_ability_cost() {
        let (_grid, mut roster, ids) = setup(&[(0, 0)]);
        let blood_magic = Ability::strike("Blood Bolt", 20).with_mana_cost(15).with_health_cost(25);
        let effects = pay_ability_cost(&mut roster, ids[0], &blood_magic).unwrap();
        assert_eq!(effects.len(), 1);
        assert_eq!(roster.get(ids[0]).unwrap().stats.current_mana, 35);
        assert_eq!(health(&roster, ids[0]), 75);

        let costly = Ability::strike("Costly", 1).with_mana_cost(100);
        assert!(matches!(
            pay_ability_cost(&mut roster, ids[0], &costly),
            Err(GameError::InsufficientMana { .. })
        ));
    }
}
