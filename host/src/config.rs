use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use atc_core::SimConfig;

/// Half an hour of play at the default tick rate.
pub const MAX_TICKS_DEFAULT: u32 = 30 * 60 * 60;

pub const ENV_TICKS_PER_SECOND: &str = "ATC_TICKS_PER_SECOND";
pub const ENV_SPAWN_TIMEOUT_SECS: &str = "ATC_SPAWN_TIMEOUT_SECS";
pub const ENV_MAX_TICKS: &str = "ATC_MAX_TICKS";

/// Defaults, then the optional JSON file, then environment overrides.
pub fn load_sim_config(path: Option<&Path>) -> Result<SimConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            serde_json::from_str::<SimConfig>(&text)
                .with_context(|| format!("invalid config json: {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn apply_env_overrides(config: &mut SimConfig) {
    config.ticks_per_second = read_env_u32(ENV_TICKS_PER_SECOND, config.ticks_per_second);
    config.spawn_timeout_secs =
        read_env_u32_allow_zero(ENV_SPAWN_TIMEOUT_SECS, config.spawn_timeout_secs);
}

/// An explicit `--max-ticks` wins over the environment.
pub fn resolve_max_ticks(cli: Option<u32>) -> u32 {
    cli.filter(|value| *value > 0)
        .unwrap_or_else(|| read_env_u32(ENV_MAX_TICKS, MAX_TICKS_DEFAULT))
}

pub(crate) fn read_env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_u32_allow_zero(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}
