//! Headless battle runner.
//!
//! Plays a scenario to its end with every unit driven by the AI. Movement
//! is completed as soon as it starts, since nothing animates it here.
//! Each outbound event is written as one JSON line.

use std::io::Write;

use serde::{Deserialize, Serialize};
use tactics_core::battle::{Battle, BattlePhase};
use tactics_core::error::GameError;
use tactics_core::scenario::ScenarioData;
use tracing::{debug, info};

use crate::error::Result;

/// Overrides applied on top of a scenario's own configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlessConfig {
    /// Replace the scenario's AI seed.
    pub seed: Option<u64>,
    /// Replace the scenario's turn cap.
    pub max_turns: Option<u32>,
}

/// A unit still standing when the battle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survivor {
    /// Unit id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Faction number.
    pub faction: u8,
    /// Health left.
    pub health: u32,
}

/// Outcome of one headless battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Scenario name.
    pub scenario: String,
    /// Seed the AI ran with.
    pub seed: u64,
    /// Winning faction, `None` for a draw.
    pub winner: Option<u8>,
    /// Unit turns played.
    pub turns: u32,
    /// Events emitted.
    pub events: usize,
    /// Units alive at the end.
    pub survivors: Vec<Survivor>,
}

/// Runs scenarios without a client.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRunner {
    config: HeadlessConfig,
}

impl HeadlessRunner {
    /// Create a runner that keeps the scenario's own settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner with overrides.
    #[must_use]
    pub fn with_config(config: HeadlessConfig) -> Self {
        Self { config }
    }

    /// The overrides in use.
    #[must_use]
    pub fn config(&self) -> &HeadlessConfig {
        &self.config
    }

    /// Build the battle for `scenario` with overrides applied and player
    /// units handed to the AI.
    pub fn build(&self, scenario: &ScenarioData) -> Result<Battle> {
        let mut scenario = scenario.clone();
        let mut config = scenario.config.clone().with_autoplay(true);
        if let Some(seed) = self.config.seed {
            config = config.with_seed(seed);
        }
        if let Some(max_turns) = self.config.max_turns {
            config = config.with_max_turns(max_turns);
        }
        scenario.config = config;
        Ok(Battle::from_scenario(&scenario)?)
    }

    /// Play `scenario` to the end, writing every event to `out` as a JSON
    /// line.
    pub fn run<W: Write>(&self, scenario: &ScenarioData, mut out: W) -> Result<GameSummary> {
        let mut battle = self.build(scenario)?;
        let seed = battle.config().seed;
        info!(scenario = %scenario.name, seed, "battle starting");

        let mut events = 0;
        battle.start_turn_cycle()?;
        let winner = loop {
            for event in battle.drain_events() {
                serde_json::to_writer(&mut out, &event)?;
                writeln!(out)?;
                events += 1;
            }
            match battle.phase() {
                BattlePhase::Finished { winner } => break winner,
                BattlePhase::AwaitingMovement(unit) => {
                    debug!(unit = %unit, "completing movement");
                    battle.report_movement_complete()?;
                }
                BattlePhase::AwaitingPlayer(_) => {
                    return Err(GameError::WrongPhase("battle is waiting for player input").into());
                }
                _ => {
                    battle.play_out()?;
                }
            }
        };
        out.flush()?;

        let summary = GameSummary {
            scenario: scenario.name.clone(),
            seed,
            winner: winner.map(|faction| faction.0),
            turns: battle.turns_taken(),
            events,
            survivors: battle
                .roster()
                .alive()
                .map(|unit| Survivor {
                    id: unit.id.0,
                    name: unit.name.clone(),
                    faction: unit.faction.0,
                    health: unit.stats.current_health,
                })
                .collect(),
        };
        info!(
            winner = ?summary.winner,
            turns = summary.turns,
            survivors = summary.survivors.len(),
            "battle finished"
        );
        Ok(summary)
    }

    /// Play `scenario` to the end, discarding the event stream.
    pub fn run_quiet(&self, scenario: &ScenarioData) -> Result<GameSummary> {
        self.run(scenario, std::io::sink())
    }
}
