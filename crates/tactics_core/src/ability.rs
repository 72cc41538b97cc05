//! Ability definitions.
//!
//! Abilities are immutable data once loaded. What an ability does when it
//! resolves is a closed set of effects, dispatched by [`AbilityEffect`].

use serde::{Deserialize, Serialize};

/// What happens when an ability resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityEffect {
    /// Change the health of every unit in the area.
    ///
    /// Positive amounts deal damage, negative amounts heal.
    Strike {
        /// Damage dealt (negative heals).
        amount: i32,
    },
    /// Self-cast buff: applies `amount` to the caster and raises its attack power.
    Empower {
        /// Damage dealt to the caster (negative heals).
        amount: i32,
        /// Permanent attack power gained.
        attack_bonus: u32,
    },
}

/// Static definition of an ability.
///
/// # Example RON
///
/// ```ron
/// Ability(
///     name: "Fireball",
///     mana_cost: 10,
///     cast_time: 40,
///     range: 4,
///     area_size: 2,
///     effect: Strike(amount: 25),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    /// Display name.
    pub name: String,
    /// Tooltip text.
    #[serde(default)]
    pub tooltip: String,
    /// Health the caster pays to use this.
    #[serde(default)]
    pub health_cost: u32,
    /// Mana the caster pays to use this.
    #[serde(default)]
    pub mana_cost: u32,
    /// Scheduler delay before the effect resolves; 0 resolves instantly.
    ///
    /// Filled by the caster's speed rating like a turn timer, so 100 takes
    /// about one full turn.
    #[serde(default)]
    pub cast_time: u32,
    /// Targeting range in orthogonal steps; 0 means self only.
    #[serde(default)]
    pub range: u32,
    /// Size of the affected area in orthogonal steps; 1 is the target cell alone.
    #[serde(default = "default_area_size")]
    pub area_size: u32,
    /// Whether the ability may target cells that hold a unit.
    #[serde(default = "default_requires_target")]
    pub requires_target: bool,
    /// The AI never considers this ability.
    #[serde(default)]
    pub ai_ignore: bool,
    /// The AI uses this on allies instead of enemies.
    #[serde(default)]
    pub ai_beneficial: bool,
    /// Resolution effect.
    pub effect: AbilityEffect,
}

const fn default_area_size() -> u32 {
    1
}

const fn default_requires_target() -> bool {
    true
}

impl Ability {
    /// An area ability dealing `amount` damage (negative heals).
    #[must_use]
    pub fn strike(name: impl Into<String>, amount: i32) -> Self {
        Self::with_effect(name, AbilityEffect::Strike { amount })
    }

    /// A self-cast buff.
    #[must_use]
    pub fn empower(name: impl Into<String>, amount: i32, attack_bonus: u32) -> Self {
        Self::with_effect(name, AbilityEffect::Empower { amount, attack_bonus })
    }

    fn with_effect(name: impl Into<String>, effect: AbilityEffect) -> Self {
        Self {
            name: name.into(),
            tooltip: String::new(),
            health_cost: 0,
            mana_cost: 0,
            cast_time: 0,
            range: 0,
            area_size: default_area_size(),
            requires_target: default_requires_target(),
            ai_ignore: false,
            ai_beneficial: false,
            effect,
        }
    }

    /// Builder method to set range.
    #[must_use]
    pub fn with_range(mut self, range: u32) -> Self {
        self.range = range;
        self
    }

    /// Builder method to set the affected area size.
    #[must_use]
    pub fn with_area(mut self, area_size: u32) -> Self {
        self.area_size = area_size;
        self
    }

    /// Builder method to set mana cost.
    #[must_use]
    pub fn with_mana_cost(mut self, mana_cost: u32) -> Self {
        self.mana_cost = mana_cost;
        self
    }

    /// Builder method to set health cost.
    #[must_use]
    pub fn with_health_cost(mut self, health_cost: u32) -> Self {
        self.health_cost = health_cost;
        self
    }

    /// Builder method to set cast time.
    #[must_use]
    pub fn with_cast_time(mut self, cast_time: u32) -> Self {
        self.cast_time = cast_time;
        self
    }

    /// Builder method marking the ability as something to use on allies.
    #[must_use]
    pub fn beneficial(mut self) -> Self {
        self.ai_beneficial = true;
        self
    }

    /// Builder method restricting the ability to empty cells.
    #[must_use]
    pub fn ground_targeted(mut self) -> Self {
        self.requires_target = false;
        self
    }

    /// Builder method hiding the ability from the AI.
    #[must_use]
    pub fn ai_ignored(mut self) -> Self {
        self.ai_ignore = true;
        self
    }

    /// Heuristic value of one successful use, before target adjustments.
    #[must_use]
    pub fn ai_score(&self) -> i32 {
        match self.effect {
            AbilityEffect::Strike { amount } => amount.saturating_abs(),
            AbilityEffect::Empower { amount, attack_bonus } => {
                amount.saturating_abs().saturating_add(attack_bonus as i32)
            }
        }
    }

    /// Always targets the caster's own cell.
    #[must_use]
    pub const fn is_self_cast(&self) -> bool {
        matches!(self.effect, AbilityEffect::Empower { .. }) || self.range == 0
    }

    /// Radius of the area flood fill around the target cell.
    #[must_use]
    pub const fn area_radius(&self) -> u32 {
        self.area_size.saturating_sub(1)
    }

    /// Considered by the AI against hostile targets.
    #[must_use]
    pub const fn is_ai_offensive(&self) -> bool {
        !self.ai_ignore && !self.ai_beneficial
    }

    /// Considered by the AI for friendly targets.
    #[must_use]
    pub const fn is_ai_supportive(&self) -> bool {
        !self.ai_ignore && self.ai_beneficial
    }

    /// Resolves when cast rather than through the scheduler.
    #[must_use]
    pub const fn is_instant(&self) -> bool {
        self.cast_time == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_score() {
        assert_eq!(Ability::strike("Fireball", 25).ai_score(), 25);
        assert_eq!(Ability::strike("Mend", -40).ai_score(), 40);
        assert_eq!(Ability::empower("Battle Cry", 0, 5).ai_score(), 5);
        assert_eq!(Ability::empower("Blood Rage", 10, 5).ai_score(), 15);
    }

    #[test]
    fn test_ai_roles() {
        let bolt = Ability::strike("Bolt", 10).with_range(3);
        assert!(bolt.is_ai_offensive());
        assert!(!bolt.is_ai_supportive());

        let heal = Ability::strike("Heal", -20).with_range(2).beneficial();
        assert!(heal.is_ai_supportive());
        assert!(!heal.is_ai_offensive());

        let hidden = heal.clone().ai_ignored();
        assert!(!hidden.is_ai_supportive());
        assert!(!hidden.is_ai_offensive());
    }

    #[test]
    fn test_self_cast_and_area() {
        assert!(Ability::empower("Focus", 0, 3).with_range(2).is_self_cast());
        assert!(Ability::strike("Nova", 10).is_self_cast());
        assert!(!Ability::strike("Bolt", 10).with_range(1).is_self_cast());

        assert_eq!(Ability::strike("Bolt", 10).area_radius(), 0);
        assert_eq!(Ability::strike("Quake", 10).with_area(3).area_radius(), 2);
        assert_eq!(Ability::strike("Odd", 10).with_area(0).area_radius(), 0);
    }

    #[test]
    fn test_ron_defaults() {
        let ability: Ability = ron::from_str(
            r#"(name: "Spark", range: 2, effect: Strike(amount: 7))"#,
        )
        .unwrap();
        assert_eq!(ability.area_size, 1);
        assert!(ability.requires_target);
        assert!(ability.is_instant());
        assert_eq!(ability.effect, AbilityEffect::Strike { amount: 7 });
    }
}
