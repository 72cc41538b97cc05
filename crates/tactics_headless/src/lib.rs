//! Headless battle runner for AI testing and balance batches.
//!
//! Loads RON scenarios and plays them to the end with every unit driven by
//! the AI. Nothing animates movement here, so each move completes as soon
//! as it starts.
//!
//! # Output
//!
//! - **stdout**: Battle events as JSON lines, or a JSON summary
//! - **stderr**: Logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Play one battle
//! cargo run -p tactics_headless -- run --scenario scenarios/skirmish.ron --seed 7
//!
//! # Play 200 seeds in parallel
//! cargo run -p tactics_headless -- batch --scenario scenarios/skirmish.ron --count 200
//!
//! # Check a scenario file
//! cargo run -p tactics_headless -- validate --scenario scenarios/skirmish.ron
//! ```

pub mod batch;
pub mod error;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, BatchConfig, BatchSummary};
pub use error::{HeadlessError, Result};
pub use runner::{GameSummary, HeadlessConfig, HeadlessRunner};
pub use scenario::{load_scenario, save_scenario, validate_scenario, ScenarioReport};
