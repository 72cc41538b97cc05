//! Batch runner for balance testing.
//!
//! Plays one scenario under many consecutive seeds in parallel using
//! rayon and aggregates the outcomes.

use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tactics_core::scenario::ScenarioData;
use tracing::{info, warn};

use crate::error::Result;
use crate::runner::{GameSummary, HeadlessConfig, HeadlessRunner};

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of battles to play.
    pub game_count: u32,
    /// Seed of the first battle; battle `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Turn cap override.
    pub max_turns: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            seed_start: 0,
            max_turns: None,
        }
    }
}

impl BatchConfig {
    /// Play `game_count` battles.
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the turn cap.
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }
}

/// Aggregate outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Scenario name.
    pub scenario: String,
    /// Battles that completed.
    pub total_games: u32,
    /// Wins keyed by faction number.
    pub wins_by_faction: BTreeMap<u8, u32>,
    /// Battles without a winner.
    pub draws: u32,
    /// Mean unit turns per battle.
    pub mean_turns: f64,
    /// Shortest battle in unit turns.
    pub min_turns: u32,
    /// Longest battle in unit turns.
    pub max_turns: u32,
    /// Battles that failed, with their seed and error.
    pub errors: Vec<BatchError>,
}

impl BatchSummary {
    /// Aggregate finished battles.
    #[must_use]
    pub fn from_games(scenario: &str, games: &[GameSummary]) -> Self {
        let mut summary = Self {
            scenario: scenario.to_string(),
            total_games: games.len() as u32,
            ..Default::default()
        };
        if games.is_empty() {
            return summary;
        }

        let mut turn_sum = 0u64;
        summary.min_turns = u32::MAX;
        for game in games {
            match game.winner {
                Some(faction) => *summary.wins_by_faction.entry(faction).or_insert(0) += 1,
                None => summary.draws += 1,
            }
            turn_sum += u64::from(game.turns);
            summary.min_turns = summary.min_turns.min(game.turns);
            summary.max_turns = summary.max_turns.max(game.turns);
        }
        summary.mean_turns = turn_sum as f64 / games.len() as f64;
        summary
    }

    /// Share of completed battles won by `faction`.
    #[must_use]
    pub fn win_rate(&self, faction: u8) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        f64::from(self.wins_by_faction.get(&faction).copied().unwrap_or(0)) / f64::from(self.total_games)
    }

    /// Save as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load from JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// A battle in the batch that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Play the batch and aggregate the results.
pub fn run_batch(scenario: &ScenarioData, config: &BatchConfig) -> BatchSummary {
    info!(
        scenario = %scenario.name,
        count = config.game_count,
        seed_start = config.seed_start,
        "starting batch"
    );

    let outcomes: Vec<(u64, Result<GameSummary>)> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let runner = HeadlessRunner::with_config(HeadlessConfig {
                seed: Some(seed),
                max_turns: config.max_turns,
            });
            (seed, runner.run_quiet(scenario))
        })
        .collect();

    let mut games = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    for (seed, outcome) in outcomes {
        match outcome {
            Ok(game) => games.push(game),
            Err(e) => {
                warn!(seed, error = %e, "battle failed");
                errors.push(BatchError {
                    seed,
                    message: e.to_string(),
                });
            }
        }
    }

    let mut summary = BatchSummary::from_games(&scenario.name, &games);
    summary.errors = errors;
    info!(
        games = summary.total_games,
        draws = summary.draws,
        mean_turns = summary.mean_turns,
        failed = summary.errors.len(),
        "batch complete"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(winner: Option<u8>, turns: u32) -> GameSummary {
        GameSummary {
            scenario: "test".into(),
            seed: 0,
            winner,
            turns,
            events: 0,
            survivors: Vec::new(),
        }
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(500).with_seed(12345).with_max_turns(40);
        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.max_turns, Some(40));
    }

    #[test]
    fn test_summary_from_games() {
        let games = [game(Some(0), 10), game(Some(1), 20), game(Some(0), 30), game(None, 40)];
        let summary = BatchSummary::from_games("test", &games);
        assert_eq!(summary.total_games, 4);
        assert_eq!(summary.wins_by_faction.get(&0), Some(&2));
        assert_eq!(summary.wins_by_faction.get(&1), Some(&1));
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.min_turns, 10);
        assert_eq!(summary.max_turns, 40);
        assert!((summary.mean_turns - 25.0).abs() < f64::EPSILON);
        assert!((summary.win_rate(0) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_survives_save_and_load() {
        let games = [
            game(Some(0), 100),
            game(Some(1), 101),
            game(None, 104),
            game(Some(0), 110),
            game(Some(0), 112),
            game(Some(1), 113),
        ];
        let summary = BatchSummary::from_games("test", &games);
        assert!((summary.mean_turns - 640.0 / 6.0).abs() < 1e-9);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        summary.save(&path).unwrap();
        let loaded = BatchSummary::load(&path).unwrap();
        assert_eq!(loaded.mean_turns.to_bits(), summary.mean_turns.to_bits());
        assert_eq!(loaded, summary);
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_games("test", &[]);
        assert_eq!(summary.total_games, 0);
        assert_eq!(summary.min_turns, 0);
        assert_eq!(summary.win_rate(0), 0.0);
    }
}
