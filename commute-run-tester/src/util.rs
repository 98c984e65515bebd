use anyhow::{Context, Result};
use commute_run_game::RunConfig;
use std::fs;
use std::path::Path;

/// Split a comma-separated CLI value into trimmed, non-empty tokens.
pub fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Load a run configuration file, falling back to the built-in defaults.
pub fn load_run_config(path: Option<&Path>) -> Result<RunConfig> {
    let Some(path) = path else {
        log::debug!("no --config given, using built-in run config");
        return Ok(RunConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    RunConfig::from_json(&json).with_context(|| format!("invalid config {}", path.display()))
}
