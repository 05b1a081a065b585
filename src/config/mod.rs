//! Generator configuration, loadable from RON or JSON.

use std::path::Path;

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONNECTION_TRIES, DEFAULT_PARTITION_CELL_SIZE, DEFAULT_SPAWN_HEIGHT_OFFSET};
use crate::instantiate::PrefabTable;
use crate::logging::TracingConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse RON config: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Overlapping placement attempts per append before the exit is rechecked
    pub connection_tries: u32,
    pub allow_rotations: bool,
    pub allow_flip: bool,
    /// Clear every collection before bootstrap
    pub clear_on_generate: bool,
    /// Bootstrap when the plugin starts
    pub generate_on_start: bool,
    pub tile_gap: f32,
    pub extra_tile_offset: Vec3,
    pub core_offset: Vec3,
    /// Put the core on the entry cell when the initial template declares none
    pub core_at_entry_fallback: bool,
    pub spawn_height_offset: f32,
    pub partition_cell_size: f32,
    /// `None` seeds from entropy
    pub seed: Option<u64>,
    pub prefabs: PrefabTable,
    pub logging: TracingConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            connection_tries: DEFAULT_CONNECTION_TRIES,
            allow_rotations: true,
            allow_flip: true,
            clear_on_generate: true,
            generate_on_start: true,
            tile_gap: 0.0,
            extra_tile_offset: Vec3::ZERO,
            core_offset: Vec3::ZERO,
            core_at_entry_fallback: false,
            spawn_height_offset: DEFAULT_SPAWN_HEIGHT_OFFSET,
            partition_cell_size: DEFAULT_PARTITION_CELL_SIZE,
            seed: None,
            prefabs: PrefabTable::default(),
            logging: TracingConfig::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads by extension: `.json` as JSON, anything else as RON
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_ron(&content),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection_tries == 0 {
            return Err(ConfigError::Invalid {
                field: "connection_tries",
                reason: "must be at least 1",
            });
        }
        if !(self.partition_cell_size.is_finite() && self.partition_cell_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "partition_cell_size",
                reason: "must be positive",
            });
        }
        if !self.tile_gap.is_finite() || !self.spawn_height_offset.is_finite() {
            return Err(ConfigError::Invalid {
                field: "tile_gap",
                reason: "must be finite",
            });
        }
        if !self.extra_tile_offset.is_finite() || !self.core_offset.is_finite() {
            return Err(ConfigError::Invalid {
                field: "offsets",
                reason: "must be finite",
            });
        }
        Ok(())
    }
}
