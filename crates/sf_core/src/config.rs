//! Game tuning and paths, read from `assets/config/game.json` when it exists.
//!
//! Every field has a default, so the file only needs the values it overrides.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::session::{DEFAULT_THRESHOLD, THRESHOLD_MAX, THRESHOLD_MIN};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub fps: u32,
    pub player_velocity: i32,
    /// Distance from either screen edge at which the camera starts following.
    pub scroll_area_width: i32,
    pub end_cooldown_ms: u64,
    pub default_threshold: u32,
    pub level_path: String,
    pub asset_root: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: "Scream Frog".to_string(),
            window_width: 500,
            window_height: 816,
            fps: 60,
            player_velocity: 5,
            scroll_area_width: 200,
            end_cooldown_ms: 1500,
            default_threshold: DEFAULT_THRESHOLD,
            level_path: "assets/levels/level1.json".to_string(),
            asset_root: "assets".to_string(),
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: GameConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Loads `path`, falling back to defaults (with a warning) when it is missing or bad.
pub fn load_config_or_default(path: &Path) -> GameConfig {
    if !path.exists() {
        log::info!("No config at '{}', using defaults", path.display());
        return GameConfig::default();
    }
    match load_config_from_path(path) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("{err}. Using default config.");
            GameConfig::default()
        }
    }
}

fn validate_config(config: &GameConfig) -> Result<(), ConfigError> {
    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Invalid(
            "window_width and window_height must be > 0".to_string(),
        ));
    }
    if config.fps == 0 {
        return Err(ConfigError::Invalid("fps must be > 0".to_string()));
    }
    if config.player_velocity <= 0 {
        return Err(ConfigError::Invalid("player_velocity must be > 0".to_string()));
    }
    if !(THRESHOLD_MIN..=THRESHOLD_MAX).contains(&config.default_threshold) {
        return Err(ConfigError::Invalid(format!(
            "default_threshold must be within [{THRESHOLD_MIN}, {THRESHOLD_MAX}]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "sf_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = temp_file_path("partial");
        fs::write(&path, r#"{ "fps": 30, "default_threshold": 150 }"#).expect("write temp file");

        let config = load_config_from_path(&path).expect("config should load");
        assert_eq!(config.fps, 30);
        assert_eq!(config.default_threshold, 150);
        assert_eq!(config.window_width, 500);
        assert_eq!(config.window_height, 816);
        assert_eq!(config.end_cooldown_ms, 1500);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let path = temp_file_path("threshold");
        fs::write(&path, r#"{ "default_threshold": 20 }"#).expect("write temp file");
        let err = load_config_from_path(&path).expect_err("threshold 20 should fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let path = temp_file_path("malformed");
        fs::write(&path, "{ fps: ").expect("write temp file");
        let err = load_config_from_path(&path).expect_err("bad json should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = temp_file_path("missing");
        assert_eq!(load_config_or_default(&path), GameConfig::default());
    }
}
