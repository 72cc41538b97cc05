//! Scenario loading.
//!
//! Scenarios are RON files holding a [`ScenarioData`]: the terrain rows,
//! the starting units and the battle configuration.

use std::path::Path;

use tactics_core::battle::Battle;
use tactics_core::scenario::ScenarioData;
use tracing::debug;

use crate::error::{HeadlessError, Result};

/// Load a scenario from a RON file.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<ScenarioData> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(HeadlessError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let scenario: ScenarioData = ron::from_str(&contents)?;
    debug!(path = %path.display(), name = %scenario.name, units = scenario.units.len(), "scenario loaded");
    Ok(scenario)
}

/// Save a scenario as pretty RON.
pub fn save_scenario<P: AsRef<Path>>(scenario: &ScenarioData, path: P) -> Result<()> {
    let text = scenario.to_ron_string()?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Summary of a scenario that parsed and built cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Units placed.
    pub units: usize,
    /// Factions with living units.
    pub factions: usize,
}

/// Parse, validate and build the battle for a scenario file.
pub fn validate_scenario<P: AsRef<Path>>(path: P) -> Result<ScenarioReport> {
    let scenario = load_scenario(path)?;
    scenario.validate()?;
    let battle = Battle::from_scenario(&scenario)?;
    Ok(ScenarioReport {
        name: scenario.name,
        width: battle.grid().width(),
        height: battle.grid().height(),
        units: battle.roster().len(),
        factions: battle.roster().living_factions().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = load_scenario("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, HeadlessError::FileNotFound(_)));
    }
}
