//! Error type for the headless runner.

use thiserror::Error;

use tactics_core::error::GameError;

/// Result type alias using [`HeadlessError`].
pub type Result<T> = std::result::Result<T, HeadlessError>;

/// Everything that can go wrong outside the core: files, formats and the
/// battle itself.
#[derive(Error, Debug)]
pub enum HeadlessError {
    /// Scenario file does not exist.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read or write a file or stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Failed to encode JSON output.
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The battle rejected the scenario or an action.
    #[error("Battle error: {0}")]
    Game(#[from] GameError),
}
