//! Data-driven battle setup.
//!
//! Scenarios and battle configuration are plain data, deserialized from
//! RON. This module does no IO; reading files is the runner's job.

use serde::{Deserialize, Serialize};

use crate::ability::Ability;
use crate::error::{GameError, Result};
use crate::grid::{Coord, Grid};
use crate::unit::{Controller, FactionId, Unit, UnitStats};

/// Timer spent when a unit turn ends, by what the unit did.
///
/// Doing less lets the unit come back sooner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnCosts {
    /// Moved and acted.
    pub full: u32,
    /// Moved or acted, not both.
    pub partial: u32,
    /// Neither moved nor acted.
    pub idle: u32,
}

impl Default for TurnCosts {
    fn default() -> Self {
        Self {
            full: 100,
            partial: 80,
            idle: 60,
        }
    }
}

impl TurnCosts {
    /// Timer cost of a turn.
    #[must_use]
    pub const fn cost(&self, moved: bool, acted: bool) -> u32 {
        match (moved, acted) {
            (true, true) => self.full,
            (false, false) => self.idle,
            _ => self.partial,
        }
    }
}

/// Battle-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Seed for the AI's random choices.
    pub seed: u64,
    /// Timer cost policy for ending unit turns.
    pub turn_costs: TurnCosts,
    /// Unit turns after which the battle is called a draw.
    pub max_turns: u32,
    /// Let the AI drive player-controlled units too.
    pub autoplay_players: bool,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            turn_costs: TurnCosts::default(),
            max_turns: 500,
            autoplay_players: false,
        }
    }
}

impl BattleConfig {
    /// Same config with a different seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Same config with a different turn cap.
    #[must_use]
    pub const fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Same config with AI-driven player units.
    #[must_use]
    pub const fn with_autoplay(mut self, autoplay_players: bool) -> Self {
        self.autoplay_players = autoplay_players;
        self
    }
}

/// One unit placement in a scenario.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     name: "Mage",
///     faction: 1,
///     position: (6, 2),
///     stats: (attack_range: 3, intelligence: 30),
///     abilities: [(name: "Fireball", range: 4, effect: Strike(amount: 25))],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitData {
    /// Display name.
    pub name: String,
    /// Faction number; units sharing it are allies.
    pub faction: u8,
    /// Who drives the unit.
    #[serde(default)]
    pub controller: Controller,
    /// Starting cell as `(x, y)`.
    pub position: (i32, i32),
    /// Stats; omitted fields take the defaults.
    #[serde(default)]
    pub stats: UnitStats,
    /// Ability slots in order.
    #[serde(default)]
    pub abilities: Vec<Ability>,
}

impl UnitData {
    /// Build the unit this entry describes. The id is assigned on insertion.
    #[must_use]
    pub fn to_unit(&self) -> Unit {
        let mut unit = Unit::new(
            self.name.clone(),
            FactionId(self.faction),
            self.controller,
            Coord::from(self.position),
        )
        .with_stats(self.stats.clone());
        unit.abilities.clone_from(&self.abilities);
        unit
    }
}

/// A complete battle setup: map, units and configuration.
///
/// Map rows use one character per cell: `.` plain, `,` rough, `^` hill,
/// `#` wall, `~` water.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioData {
    /// Scenario name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Terrain rows, top row first.
    pub map: Vec<String>,
    /// Units in insertion order; this order breaks speed ties.
    pub units: Vec<UnitData>,
    /// Battle settings.
    #[serde(default)]
    pub config: BattleConfig,
}

impl ScenarioData {
    /// Parse a scenario from RON text.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::from_str(source).map_err(|err| GameError::InvalidScenario(err.to_string()))
    }

    /// Serialize back to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|err| GameError::InvalidScenario(err.to_string()))
    }

    /// Build the terrain grid from the map rows.
    pub fn build_grid(&self) -> Result<Grid> {
        Grid::from_rows(&self.map)
    }

    /// Check the data without building a battle.
    pub fn validate(&self) -> Result<()> {
        if self.units.is_empty() {
            return Err(GameError::InvalidScenario("scenario has no units".into()));
        }
        let grid = self.build_grid()?;
        for data in &self.units {
            let position = Coord::from(data.position);
            if !grid.in_bounds(position) {
                return Err(GameError::InvalidScenario(format!(
                    "unit '{}' placed outside the map at {position}",
                    data.name
                )));
            }
            if data.stats.speed_rating == 0 {
                return Err(GameError::InvalidScenario(format!(
                    "unit '{}' has zero speed_rating",
                    data.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::AbilityEffect;
    use crate::grid::TerrainKind;

    const SAMPLE: &str = r#"
        ScenarioData(
            name: "Ford",
            map: [
                "..~..",
                "..,..",
                "..#..",
            ],
            units: [
                (name: "Knight", faction: 0, controller: Player, position: (0, 1)),
                (
                    name: "Mage",
                    faction: 1,
                    position: (4, 1),
                    stats: (attack_range: 3, speed_rating: 20),
                    abilities: [(name: "Bolt", range: 4, effect: Strike(amount: 20))],
                ),
            ],
            config: (seed: 7, max_turns: 40),
        )
    "#;

    #[test]
    fn test_turn_costs() {
        let costs = TurnCosts::default();
        assert_eq!(costs.cost(true, true), 100);
        assert_eq!(costs.cost(true, false), 80);
        assert_eq!(costs.cost(false, true), 80);
        assert_eq!(costs.cost(false, false), 60);
    }

    #[test]
    fn test_parse_sample() {
        let scenario = ScenarioData::from_ron_str(SAMPLE).unwrap();
        assert_eq!(scenario.units.len(), 2);
        assert_eq!(scenario.config.seed, 7);
        assert_eq!(scenario.config.max_turns, 40);
        assert_eq!(scenario.config.turn_costs, TurnCosts::default());

        let mage = scenario.units[1].to_unit();
        assert_eq!(mage.faction, FactionId(1));
        assert_eq!(mage.controller, Controller::Ai);
        assert_eq!(mage.stats.attack_range, 3);
        assert_eq!(mage.stats.movement_distance, 4);
        assert_eq!(mage.abilities[0].effect, AbilityEffect::Strike { amount: 20 });

        let grid = scenario.build_grid().unwrap();
        assert_eq!((grid.width(), grid.height()), (5, 3));
        assert_eq!(grid.cell_at(Coord::new(2, 0)).unwrap().terrain, TerrainKind::Water);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_ron_round_trip() {
        let scenario = ScenarioData::from_ron_str(SAMPLE).unwrap();
        let text = scenario.to_ron_string().unwrap();
        assert_eq!(ScenarioData::from_ron_str(&text).unwrap(), scenario);
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            ScenarioData::from_ron_str("ScenarioData(name: 3)"),
            Err(GameError::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_units() {
        let mut scenario = ScenarioData::from_ron_str(SAMPLE).unwrap();
        scenario.units[0].position = (9, 9);
        assert!(matches!(scenario.validate(), Err(GameError::InvalidScenario(_))));

        let mut scenario = ScenarioData::from_ron_str(SAMPLE).unwrap();
        scenario.units[1].stats.speed_rating = 0;
        assert!(scenario.validate().is_err());

        let mut scenario = ScenarioData::from_ron_str(SAMPLE).unwrap();
        scenario.units.clear();
        assert!(scenario.validate().is_err());
    }
}
