use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::interpreter::InterpreterSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Where and how to reach the arithmetic engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    pub namespace: String,
    pub xsrf_token: String,
    pub timeout_secs: u64,
}

impl EngineConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
    pub const MIN_TIMEOUT_SECS: u64 = 1;
    pub const MAX_TIMEOUT_SECS: u64 = 120;

    pub fn sanitize_timeout(value: u64) -> u64 {
        value.clamp(Self::MIN_TIMEOUT_SECS, Self::MAX_TIMEOUT_SECS)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            namespace: "/api/abacus".to_string(),
            xsrf_token: "dev-token".to_string(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Pixel geometry of the rendered stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub cell: u32,
    pub col_gap: u32,
    pub row_gap: u32,
}

impl StageConfig {
    pub const DEFAULT_CELL: u32 = 20;
    pub const MIN_CELL: u32 = 4;
    pub const MAX_CELL: u32 = 128;
    pub const MAX_GAP: u32 = 64;

    pub fn sanitize_cell(value: u32) -> u32 {
        value.clamp(Self::MIN_CELL, Self::MAX_CELL)
    }

    pub fn sanitize_gap(value: u32) -> u32 {
        value.min(Self::MAX_GAP)
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            cell: Self::DEFAULT_CELL,
            col_gap: 4,
            row_gap: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbacusConfig {
    pub engine: EngineConfig,
    pub interpreter: InterpreterSettings,
    pub stage: StageConfig,
    pub log: LogConfig,
}

impl AbacusConfig {
    /// Loads the configuration from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses and sanitizes a TOML document
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(text)?;
        config.sanitize();
        Ok(config)
    }

    /// Clamps numeric settings into their supported ranges
    pub fn sanitize(&mut self) {
        self.engine.timeout_secs = EngineConfig::sanitize_timeout(self.engine.timeout_secs);
        self.stage.cell = StageConfig::sanitize_cell(self.stage.cell);
        self.stage.col_gap = StageConfig::sanitize_gap(self.stage.col_gap);
        self.stage.row_gap = StageConfig::sanitize_gap(self.stage.row_gap);
    }
}
