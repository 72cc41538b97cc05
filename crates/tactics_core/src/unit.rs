//! Units, their stats and the battle roster.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ability::Ability;
use crate::error::{GameError, Result};
use crate::grid::Coord;

/// Unique identifier for units within a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side a unit fights for. Units sharing a faction are friendly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct FactionId(pub u8);

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "faction {}", self.0)
    }
}

/// Who decides a unit's actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Controller {
    /// Commands arrive through the player input calls.
    Player,
    /// The AI decision engine picks actions.
    #[default]
    Ai,
}

/// Unit statistics.
///
/// Every field has a default, so scenario files only list what differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStats {
    /// Class label shown to players.
    pub class_name: String,
    /// Character level.
    pub level: u32,
    /// Whether movement may use diagonal steps.
    pub can_move_diagonally: bool,
    /// Movement points per turn.
    pub movement_distance: u32,
    /// Melee/ranged attack reach in orthogonal steps.
    pub attack_range: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Current health; the unit dies at 0.
    pub current_health: u32,
    /// Maximum mana.
    pub max_mana: u32,
    /// Current mana.
    pub current_mana: u32,
    /// Damage dealt by a basic attack.
    pub attack_power: u32,
    /// Bonus applied to offensive ability scores.
    pub intelligence: u32,
    /// Reduces the AI's value of attacking this unit.
    pub defence: u32,
    /// Reduces the AI's value of casting on this unit.
    pub resistance: u32,
    /// Turn timer gained per scheduler tick. Must be positive.
    pub speed_rating: u32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            class_name: "Soldier".into(),
            level: 1,
            can_move_diagonally: false,
            movement_distance: 4,
            attack_range: 1,
            max_health: 100,
            current_health: 100,
            max_mana: 50,
            current_mana: 50,
            attack_power: 15,
            intelligence: 10,
            defence: 15,
            resistance: 15,
            speed_rating: 15,
        }
    }
}

impl UnitStats {
    /// Check the stats for values the battle cannot run with.
    pub fn validate(&self, unit: UnitId) -> Result<()> {
        let invalid = |message: &str| {
            Err(GameError::InvalidStat {
                unit,
                message: message.into(),
            })
        };
        if self.speed_rating == 0 {
            return invalid("speed_rating must be positive");
        }
        if self.max_health == 0 {
            return invalid("max_health must be positive");
        }
        if self.current_health > self.max_health {
            return invalid("current_health exceeds max_health");
        }
        if self.current_mana > self.max_mana {
            return invalid("current_mana exceeds max_mana");
        }
        Ok(())
    }

    /// Clamp current health and mana into their maximums.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.current_health = self.current_health.min(self.max_health);
        self.current_mana = self.current_mana.min(self.max_mana);
        self
    }
}

/// Result of a health change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthChange {
    /// Health went down by this much; the unit is still standing.
    Damaged(u32),
    /// Health went down by this much and reached zero.
    Killed(u32),
    /// Health went up by this much.
    Healed(u32),
}

/// A unit on the battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier, assigned by the [`Roster`].
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Side the unit fights for.
    pub faction: FactionId,
    /// Who picks the unit's actions.
    pub controller: Controller,
    /// Current cell; always matches the grid's occupant record.
    pub position: Coord,
    /// Combat and movement stats.
    pub stats: UnitStats,
    /// Abilities in slot order.
    pub abilities: Vec<Ability>,
}

impl Unit {
    /// Create a unit. The id is replaced when it joins a [`Roster`].
    #[must_use]
    pub fn new(name: impl Into<String>, faction: FactionId, controller: Controller, position: Coord) -> Self {
        Self {
            id: UnitId::default(),
            name: name.into(),
            faction,
            controller,
            position,
            stats: UnitStats::default(),
            abilities: Vec::new(),
        }
    }

    /// Builder method to set stats.
    #[must_use]
    pub fn with_stats(mut self, stats: UnitStats) -> Self {
        self.stats = stats;
        self
    }

    /// Builder method to append an ability.
    #[must_use]
    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.abilities.push(ability);
        self
    }

    /// Health above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.stats.current_health > 0
    }

    /// Health a heal could restore.
    #[must_use]
    pub const fn missing_health(&self) -> u32 {
        self.stats.max_health.saturating_sub(self.stats.current_health)
    }

    /// Same faction.
    #[must_use]
    pub fn is_friendly_to(&self, other: &Self) -> bool {
        self.faction == other.faction
    }

    /// Fights from a distance or through abilities rather than in melee.
    #[must_use]
    pub const fn is_ranged_or_caster(&self) -> bool {
        self.stats.attack_range > 1 || self.stats.intelligence > self.stats.attack_power
    }

    /// Longest range among the unit's abilities, 0 without any.
    #[must_use]
    pub fn max_ability_range(&self) -> u32 {
        self.abilities.iter().map(|ability| ability.range).max().unwrap_or(0)
    }

    /// Ability in `slot`.
    pub fn ability(&self, slot: usize) -> Result<&Ability> {
        self.abilities
            .get(slot)
            .ok_or(GameError::UnknownAbility { unit: self.id, slot })
    }

    /// Deduct mana for an ability, failing without change if short.
    pub fn spend_mana(&mut self, cost: u32) -> Result<()> {
        if self.stats.current_mana < cost {
            return Err(GameError::InsufficientMana {
                required: cost,
                available: self.stats.current_mana,
            });
        }
        self.stats.current_mana -= cost;
        Ok(())
    }

    /// Apply a signed health change: positive damages, negative heals.
    ///
    /// Damage saturates at zero health and healing at max health.
    pub fn apply_health_change(&mut self, amount: i32) -> HealthChange {
        let stats = &mut self.stats;
        if amount >= 0 {
            let dealt = amount.unsigned_abs().min(stats.current_health);
            stats.current_health -= dealt;
            if stats.current_health == 0 {
                HealthChange::Killed(dealt)
            } else {
                HealthChange::Damaged(dealt)
            }
        } else {
            let headroom = stats.max_health.saturating_sub(stats.current_health);
            let healed = amount.unsigned_abs().min(headroom);
            stats.current_health += healed;
            HealthChange::Healed(healed)
        }
    }
}

/// Every unit in a battle, keyed by id.
///
/// Dead units stay in the roster so late commands for them can be told
/// apart from commands for units that never existed. Iteration is in id
/// order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    units: BTreeMap<UnitId, Unit>,
    next_id: u32,
}

impl Roster {
    /// Create an empty roster. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Id the next inserted unit will get.
    #[must_use]
    pub fn next_id(&self) -> UnitId {
        UnitId(self.next_id.max(1))
    }

    /// Insert a unit and return its freshly assigned id.
    pub fn insert(&mut self, mut unit: Unit) -> UnitId {
        let id = UnitId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        unit.id = id;
        self.units.insert(id, unit);
        id
    }

    /// Get a unit by id, dead or alive.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable reference to a unit by id.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// A living unit, or the reason there isn't one.
    pub fn living(&self, id: UnitId) -> Result<&Unit> {
        match self.units.get(&id) {
            Some(unit) if unit.is_alive() => Ok(unit),
            Some(_) => Err(GameError::UnitDead(id)),
            None => Err(GameError::UnitNotFound(id)),
        }
    }

    /// Mutable access to a living unit.
    pub fn living_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        match self.units.get_mut(&id) {
            Some(unit) if unit.is_alive() => Ok(unit),
            Some(_) => Err(GameError::UnitDead(id)),
            None => Err(GameError::UnitNotFound(id)),
        }
    }

    /// Number of units, including the dead.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// True if no unit was ever added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// All units in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Living units in id order.
    pub fn alive(&self) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(|unit| unit.is_alive())
    }

    /// Factions with at least one living unit.
    #[must_use]
    pub fn living_factions(&self) -> BTreeSet<FactionId> {
        self.alive().map(|unit| unit.faction).collect()
    }
}
