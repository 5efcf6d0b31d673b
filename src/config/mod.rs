//! Configuration module for bead-abacus
//!
//! Settings are read from an optional TOML file. Every field has a default
//! so a missing file or a partial file still yields a usable configuration.

pub mod settings;

pub use settings::{AbacusConfig, ConfigError, EngineConfig, LogConfig, StageConfig};
