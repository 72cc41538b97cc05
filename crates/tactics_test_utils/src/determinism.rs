//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a battle produces identical
//! results given an identical setup and seed.
//!
//! # Testing Strategy
//!
//! A battle must replay exactly from its scenario and seed. Sources of
//! non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The roster iterates in sorted unit id order.
//!
//! - **System randomness**: The AI only draws from a ChaCha stream seeded
//!   by [`BattleConfig::seed`](tactics_core::scenario::BattleConfig).
//!
//! - **Floating-point math**: The core is integer-only; cosmetic heights
//!   are fixed-point.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual components (scheduler order, AI choices)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full battles are reproducible
//! 4. **Parallel tests**: Running N battles on separate threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use serde::Serialize;
use tactics_core::battle::{Battle, BattleEvent};
use tracing::debug;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Event-log hashes from each run.
    pub hashes: Vec<u64>,
    /// Unit turns played in the first run.
    pub turns: u32,
}

impl DeterminismResult {
    fn from_runs(hashes: Vec<u64>, turns: u32) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            turns,
        }
    }

    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Turns: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Hash any serializable value through its RON text.
///
/// # Panics
///
/// Panics if the value cannot be serialized.
#[must_use]
pub fn ron_hash<T: Serialize>(value: &T) -> u64 {
    let text = ron::to_string(value).expect("value serializes to RON");
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Play a battle to its end and hash everything it emitted.
///
/// # Panics
///
/// Panics if the battle fails or needs player input.
#[must_use]
pub fn play_and_hash(mut battle: Battle) -> (u64, u32) {
    battle.play_out().expect("battle plays out without player input");
    let events: Vec<BattleEvent> = battle.drain_events();
    debug!(events = events.len(), turns = battle.turns_taken(), "battle played");
    (ron_hash(&events), battle.turns_taken())
}

/// Play the battle built by `setup` several times and compare event logs.
///
/// # Example
///
/// ```ignore
/// use tactics_test_utils::determinism::verify_battle_determinism;
/// use tactics_test_utils::fixtures::skirmish_battle;
///
/// verify_battle_determinism(3, || skirmish_battle(42)).assert_deterministic();
/// ```
pub fn verify_battle_determinism<F>(runs: usize, setup: F) -> DeterminismResult
where
    F: Fn() -> Battle,
{
    let mut hashes = Vec::with_capacity(runs);
    let mut turns = 0;
    for run in 0..runs {
        let (hash, played) = play_and_hash(setup());
        if run == 0 {
            turns = played;
        }
        hashes.push(hash);
    }
    DeterminismResult::from_runs(hashes, turns)
}

/// Play the battle built by `setup` on `num_battles` threads at once.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a battle thread panics.
pub fn run_parallel_battles<F>(setup: F, num_battles: usize) -> DeterminismResult
where
    F: Fn() -> Battle + Sync,
{
    let setup_ref = &setup;
    let results: Vec<(u64, u32)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..num_battles)
            .map(|_| scope.spawn(move || play_and_hash(setup_ref())))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("battle thread panicked"))
            .collect()
    });
    let turns = results.first().map_or(0, |&(_, turns)| turns);
    DeterminismResult::from_runs(results.into_iter().map(|(hash, _)| hash).collect(), turns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_hashes() {
        let result = DeterminismResult::from_runs(vec![3, 1, 3], 10);
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes(), vec![1, 3]);
    }

    #[test]
    #[should_panic(expected = "non-deterministic")]
    fn test_assert_panics_on_mismatch() {
        DeterminismResult::from_runs(vec![1, 2], 0).assert_deterministic();
    }

    #[test]
    fn test_ron_hash_is_stable() {
        assert_eq!(ron_hash(&vec![1, 2, 3]), ron_hash(&vec![1, 2, 3]));
        assert_ne!(ron_hash(&vec![1, 2, 3]), ron_hash(&vec![3, 2, 1]));
    }
}
