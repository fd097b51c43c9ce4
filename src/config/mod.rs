//! # Configuration Management Module
//!
//! Loads and writes the TOML configuration for mushgrid.
//!
//! ## Configuration Structure
//!
//! - [`GameConfig`] - Game name and greeting
//! - [`StorageConfig`] - Where the sled database lives
//! - [`WorldConfig`] - Map radius, exit policy, limits on names and text
//! - [`LoggingConfig`] - Log level and optional log file
//!
//! ## Configuration File Format
//!
//! ```toml
//! [game]
//! name = "mushgrid"
//! welcome_message = "Welcome, wanderer."
//!
//! [storage]
//! data_dir = "./data"
//!
//! [world]
//! map_radius = 3
//! allow_duplicate_exits = true
//!
//! [logging]
//! level = "info"
//! file = "mushgrid.log"
//! ```
//!
//! Every section and field has a default, so an empty file is a valid config.

use anyhow::{anyhow, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

use crate::mush::REQUIRED_START_LOCATION_ID;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub name: String,
    pub welcome_message: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            name: "mushgrid".to_string(),
            welcome_message: "Welcome, wanderer. Type HELP for commands.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Optional override for the sled database path; defaults to `<data_dir>/world`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            db_path: None,
        }
    }
}

impl StorageConfig {
    pub fn world_db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir).join("world"),
        }
    }
}

/// Largest MAP radius honoured; bigger values are clamped to this.
pub const MAX_MAP_RADIUS: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Cells shown on each side of the viewer by MAP, up to [`MAX_MAP_RADIUS`].
    pub map_radius: u32,
    /// When false, EXPLORE refuses a direction that already has an exit.
    pub allow_duplicate_exits: bool,
    /// Room new players start in; a home pointing here counts as no home.
    pub start_room: String,
    pub max_name_length: usize,
    pub max_text_length: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            map_radius: 3,
            allow_duplicate_exits: true,
            start_room: REQUIRED_START_LOCATION_ID.to_string(),
            max_name_length: 60,
            max_text_length: 1000,
        }
    }
}

impl WorldConfig {
    pub fn effective_map_radius(&self) -> u32 {
        self.map_radius.min(MAX_MAP_RADIUS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("mushgrid.log".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Parsed level, falling back to `Info` on unrecognized input.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub storage: StorageConfig,
    pub world: WorldConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        if config.world.map_radius > MAX_MAP_RADIUS {
            warn!(
                "world.map_radius {} in {} exceeds {}; clamping",
                config.world.map_radius, path, MAX_MAP_RADIUS
            );
            config.world.map_radius = MAX_MAP_RADIUS;
        }

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}
