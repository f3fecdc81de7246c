//! Application-level configuration loading, including the default game rules.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::engine::settings::PointValues;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "HIT_PARADE_CONFIG_PATH";

const DEFAULT_POINTS: PointValues = PointValues {
    artist: 1,
    title: 1,
    year: 1,
    bonus: 1,
};
const DEFAULT_SKIPS_PER_PLAYER: u32 = 3;
const DEFAULT_SKIP_COST: u32 = 1;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_SSE_CAPACITY: usize = 32;

/// Rules applied when a start request leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameDefaults {
    /// Per-category point values.
    pub points: PointValues,
    /// Skips granted to every player.
    pub skips_per_player: u32,
    /// Points deducted per skip.
    pub skip_cost: u32,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    defaults: GameDefaults,
    poll_interval: Duration,
    sse_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        poll_interval_secs = app_config.poll_interval.as_secs(),
                        "loaded game defaults from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Rules used when a start request omits them.
    pub fn defaults(&self) -> GameDefaults {
        self.defaults
    }

    /// How often the background timer checks elapsed time.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Capacity of the SSE broadcast channel.
    pub fn sse_capacity(&self) -> usize {
        self.sse_capacity
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    points: Option<RawPoints>,
    skips_per_player: Option<u32>,
    skip_cost: Option<u32>,
    poll_interval_secs: Option<u64>,
    sse_capacity: Option<usize>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of the default point values.
struct RawPoints {
    artist: u32,
    title: u32,
    year: u32,
    bonus: u32,
}

impl From<RawPoints> for PointValues {
    fn from(value: RawPoints) -> Self {
        Self {
            artist: value.artist,
            title: value.title,
            year: value.year,
            bonus: value.bonus,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = GameDefaults {
            points: value.points.map(Into::into).unwrap_or(DEFAULT_POINTS),
            skips_per_player: value.skips_per_player.unwrap_or(DEFAULT_SKIPS_PER_PLAYER),
            skip_cost: value.skip_cost.unwrap_or(DEFAULT_SKIP_COST),
        };
        let poll_interval_secs = value
            .poll_interval_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        Self {
            defaults,
            poll_interval: Duration::from_secs(poll_interval_secs),
            sse_capacity: value
                .sse_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(DEFAULT_SSE_CAPACITY),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "skip_cost": 2, "poll_interval_secs": 0 }"#).unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.defaults().skip_cost, 2);
        assert_eq!(config.defaults().skips_per_player, DEFAULT_SKIPS_PER_PLAYER);
        assert_eq!(config.defaults().points, DEFAULT_POINTS);
        assert_eq!(
            config.poll_interval(),
            Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)
        );
    }

    #[test]
    fn custom_points_are_loaded() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "points": { "artist": 1, "title": 2, "year": 1, "bonus": 2 } }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.defaults().points.max_per_turn(), 6);
    }
}
