//! Test fixtures and helpers.
//!
//! Pre-built grids, units, abilities and scenarios for consistent testing.

use tactics_core::prelude::*;

/// An all-plain grid.
#[must_use]
pub fn open_grid(width: u32, height: u32) -> Grid {
    Grid::new(width, height)
}

/// 7x5 grid with a wall down the middle and one gap at the bottom.
///
/// ```text
/// ...#...
/// ...#...
/// ...#...
/// ...#...
/// .......
/// ```
///
/// # Panics
///
/// Panics if the built-in map is malformed.
#[must_use]
pub fn wall_with_gap() -> Grid {
    Grid::from_rows(&["...#...", "...#...", "...#...", "...#...", "......."]).expect("fixture map is valid")
}

/// A default soldier controlled by the AI.
#[must_use]
pub fn soldier(faction: u8, x: i32, y: i32) -> Unit {
    Unit::new("Soldier", FactionId(faction), Controller::Ai, Coord::new(x, y))
}

/// A default soldier controlled by the player.
#[must_use]
pub fn player_soldier(faction: u8, x: i32, y: i32) -> Unit {
    Unit::new("Soldier", FactionId(faction), Controller::Player, Coord::new(x, y))
}

/// Same unit with a different speed rating.
#[must_use]
pub fn with_speed(mut unit: Unit, speed_rating: u32) -> Unit {
    unit.stats.speed_rating = speed_rating;
    unit
}

/// Same unit with a different movement allowance.
#[must_use]
pub fn with_movement(mut unit: Unit, movement_distance: u32) -> Unit {
    unit.stats.movement_distance = movement_distance;
    unit
}

/// A caster with a fireball. Counts as ranged for positioning.
#[must_use]
pub fn mage(faction: u8, x: i32, y: i32) -> Unit {
    let stats = UnitStats {
        class_name: "Mage".into(),
        attack_power: 8,
        intelligence: 30,
        max_mana: 60,
        current_mana: 60,
        ..UnitStats::default()
    };
    Unit::new("Mage", FactionId(faction), Controller::Ai, Coord::new(x, y))
        .with_stats(stats)
        .with_ability(fireball())
}

/// A support caster with a heal.
#[must_use]
pub fn priest(faction: u8, x: i32, y: i32) -> Unit {
    let stats = UnitStats {
        class_name: "Priest".into(),
        attack_power: 6,
        intelligence: 20,
        ..UnitStats::default()
    };
    Unit::new("Priest", FactionId(faction), Controller::Ai, Coord::new(x, y))
        .with_stats(stats)
        .with_ability(mend())
}

/// Instant area damage: 25 damage, range 4, radius 1, 10 mana.
#[must_use]
pub fn fireball() -> Ability {
    Ability::strike("Fireball", 25)
        .with_range(4)
        .with_area(2)
        .with_mana_cost(10)
}

/// Delayed heavy damage: 40 damage, range 5, resolves after 60 timer.
#[must_use]
pub fn meteor() -> Ability {
    Ability::strike("Meteor", 40)
        .with_range(5)
        .with_area(2)
        .with_mana_cost(20)
        .with_cast_time(60)
}

/// Single-target heal for 30, range 3.
#[must_use]
pub fn mend() -> Ability {
    Ability::strike("Mend", -30)
        .with_range(3)
        .with_mana_cost(10)
        .beneficial()
}

/// Self buff: costs 10 health, grants 8 attack power.
#[must_use]
pub fn blood_rage() -> Ability {
    Ability::empower("Blood Rage", 10, 8)
}

/// RON text of a small two-faction skirmish.
pub const SKIRMISH_RON: &str = r#"
ScenarioData(
    name: "Skirmish",
    description: "Three against three across a broken wall.",
    map: [
        "..........",
        "..,,..~~..",
        "..#...~~..",
        "..#..^....",
        "..#..^..#.",
        "....,,..#.",
        "..~~....#.",
        "..........",
    ],
    units: [
        (
            name: "Knight",
            faction: 0,
            controller: Player,
            position: (0, 3),
            stats: (class_name: "Knight", max_health: 120, current_health: 120, attack_power: 20, defence: 20, speed_rating: 14),
        ),
        (
            name: "Mage",
            faction: 0,
            controller: Player,
            position: (0, 5),
            stats: (class_name: "Mage", attack_power: 8, intelligence: 30, speed_rating: 12),
            abilities: [
                (name: "Fireball", mana_cost: 10, range: 4, area_size: 2, effect: Strike(amount: 25)),
            ],
        ),
        (
            name: "Priest",
            faction: 0,
            controller: Player,
            position: (1, 7),
            stats: (class_name: "Priest", attack_power: 6, intelligence: 20, speed_rating: 11),
            abilities: [
                (name: "Mend", mana_cost: 10, range: 3, ai_beneficial: true, effect: Strike(amount: -30)),
            ],
        ),
        (
            name: "Brute",
            faction: 1,
            position: (9, 3),
            stats: (class_name: "Brute", max_health: 140, current_health: 140, attack_power: 22, speed_rating: 10),
            abilities: [
                (name: "Blood Rage", effect: Empower(amount: 10, attack_bonus: 8)),
            ],
        ),
        (
            name: "Warlock",
            faction: 1,
            position: (9, 1),
            stats: (class_name: "Warlock", attack_power: 8, intelligence: 28, speed_rating: 13),
            abilities: [
                (name: "Meteor", mana_cost: 20, cast_time: 60, range: 5, area_size: 2, effect: Strike(amount: 40)),
            ],
        ),
        (
            name: "Archer",
            faction: 1,
            position: (9, 6),
            stats: (class_name: "Archer", attack_range: 3, attack_power: 14, speed_rating: 16),
        ),
    ],
    config: (seed: 1, max_turns: 300),
)
"#;

/// The skirmish scenario, parsed.
///
/// # Panics
///
/// Panics if [`SKIRMISH_RON`] is malformed.
#[must_use]
pub fn skirmish_scenario() -> ScenarioData {
    ScenarioData::from_ron_str(SKIRMISH_RON).expect("skirmish fixture parses")
}

/// The skirmish as a battle with every unit AI-driven.
///
/// # Panics
///
/// Panics if the scenario cannot be built.
#[must_use]
pub fn skirmish_battle(seed: u64) -> Battle {
    let mut scenario = skirmish_scenario();
    scenario.config = scenario.config.with_seed(seed).with_autoplay(true);
    Battle::from_scenario(&scenario).expect("skirmish fixture builds")
}

/// Two default soldiers facing each other on an open 6x6 grid.
///
/// # Panics
///
/// Panics if placement fails.
#[must_use]
pub fn duel(seed: u64) -> Battle {
    let config = BattleConfig::default().with_seed(seed).with_autoplay(true);
    let mut battle = Battle::new(open_grid(6, 6), config);
    battle.add_unit(soldier(0, 0, 0)).expect("duel placement");
    battle.add_unit(soldier(1, 5, 5)).expect("duel placement");
    battle
}
