use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::settings::EngineConfig;

const ENV_CONFIG_PATH: &str = "CONFSCHED_CONFIG";
const ENV_CHECK_PRESENTERS: &str = "CONFSCHED_CHECK_PRESENTERS";
const ENV_CHECK_ROOMS: &str = "CONFSCHED_CHECK_ROOMS";
const ENV_CHECK_TRACKS: &str = "CONFSCHED_CHECK_TRACKS";
const ENV_IGNORE_FORCED: &str = "CONFSCHED_IGNORE_FORCED";
const ENV_MAX_COMPARISONS: &str = "CONFSCHED_MAX_COMPARISONS";
const ENV_SCAN_TIME_LIMIT_MS: &str = "CONFSCHED_SCAN_TIME_LIMIT_MS";

/// Defaults, then the YAML file named by `CONFSCHED_CONFIG`, then env overrides.
pub fn load_config() -> AppResult<EngineConfig> {
    load_config_with(|key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable variable lookup.
pub fn load_config_with<F>(lookup: F) -> AppResult<EngineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(ENV_CONFIG_PATH).filter(|path| !path.trim().is_empty()) {
        Some(path) => load_config_file(Path::new(path.trim()))?,
        None => EngineConfig::default(),
    };

    apply_env_overrides(&mut config, &lookup)?;

    info!(
        target: "app::config",
        check_presenters = config.check_presenters,
        check_rooms = config.check_rooms,
        check_tracks = config.check_tracks,
        ignore_forced = config.ignore_forced,
        max_comparisons = ?config.max_comparisons,
        scan_time_limit_ms = ?config.scan_time_limit_ms,
        "engine configuration loaded"
    );
    Ok(config)
}

pub fn load_config_file(path: &Path) -> AppResult<EngineConfig> {
    debug!(target: "app::config", path = %path.display(), "reading configuration file");
    let raw = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(format!("cannot read {}: {err}", path.display()))
    })?;
    if raw.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    let config: EngineConfig = serde_yaml::from_str(&raw)?;
    Ok(config)
}

fn apply_env_overrides<F>(config: &mut EngineConfig, lookup: &F) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = read_flag(lookup, ENV_CHECK_PRESENTERS)? {
        config.check_presenters = value;
    }
    if let Some(value) = read_flag(lookup, ENV_CHECK_ROOMS)? {
        config.check_rooms = value;
    }
    if let Some(value) = read_flag(lookup, ENV_CHECK_TRACKS)? {
        config.check_tracks = value;
    }
    if let Some(value) = read_flag(lookup, ENV_IGNORE_FORCED)? {
        config.ignore_forced = value;
    }
    if let Some(value) = read_number::<u64, _>(lookup, ENV_MAX_COMPARISONS)? {
        config.max_comparisons = Some(value);
    }
    if let Some(value) = read_number::<u64, _>(lookup, ENV_SCAN_TIME_LIMIT_MS)? {
        config.scan_time_limit_ms = Some(value);
    }
    Ok(())
}

fn read_flag<F>(lookup: &F, key: &str) -> AppResult<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => Err(AppError::config(format!("{key} expects a boolean, got {other:?}"))),
    }
}

fn read_number<T, F>(lookup: &F, key: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|err| AppError::config(format!("{key} expects a number, got {trimmed:?}: {err}")))
}
