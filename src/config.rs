//! Engine and service configuration
//!
//! Configuration is a YAML document mirrored by typed structs. Every field
//! has a default, so an empty file (or no file) yields the standard rules.
//!
//! ```yaml
//! engine:
//!   omni_probability: 0.125
//!   max_rounds: 15
//! default_per_page: 20
//! ```

use crate::game::VerbosityLevel;
use crate::TcgError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse config YAML: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl From<ConfigError> for TcgError {
    fn from(e: ConfigError) -> Self {
        TcgError::InvalidConfig(e.to_string())
    }
}

/// Rule constants of a duel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chance that a rolled die is omni
    pub omni_probability: f64,
    pub dice_per_roll: usize,
    pub initial_hand: usize,
    pub hand_cap: usize,
    pub end_phase_draw: usize,
    /// Reaching this round number without a winner is a draw
    pub max_rounds: u32,
    pub max_supports: usize,
    pub max_summons: usize,
    /// Unaligned dice paid by a voluntary character switch
    pub switch_cost: u8,
    /// Narration level for duel loggers
    pub verbosity: VerbosityLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            omni_probability: 0.125,
            dice_per_roll: 8,
            initial_hand: 5,
            hand_cap: 10,
            end_phase_draw: 2,
            max_rounds: 15,
            max_supports: 4,
            max_summons: 4,
            switch_cost: 1,
            verbosity: VerbosityLevel::Normal,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.omni_probability) {
            return Err(ConfigError::Invalid {
                field: "omni_probability",
                reason: format!("{} is outside [0, 1]", self.omni_probability),
            });
        }
        if self.dice_per_roll == 0 {
            return Err(ConfigError::Invalid {
                field: "dice_per_roll",
                reason: "must be positive".to_string(),
            });
        }
        if self.hand_cap == 0 || self.initial_hand > self.hand_cap {
            return Err(ConfigError::Invalid {
                field: "hand_cap",
                reason: format!(
                    "hand cap {} must be positive and hold the initial hand of {}",
                    self.hand_cap, self.initial_hand
                ),
            });
        }
        if self.max_rounds < 2 {
            return Err(ConfigError::Invalid {
                field: "max_rounds",
                reason: "a duel needs at least one full round".to_string(),
            });
        }
        if self.max_supports == 0 || self.max_summons == 0 {
            return Err(ConfigError::Invalid {
                field: "max_supports",
                reason: "support and summon zones need room for one card".to_string(),
            });
        }
        Ok(())
    }
}

/// Settings of the service facade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub engine: EngineConfig,
    /// Catalog snapshot loaded at startup
    pub catalog_path: Option<PathBuf>,
    pub default_per_page: usize,
    pub max_per_page: usize,
    /// Fixed dice seed for every new duel (tests and replays)
    pub seed: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            engine: EngineConfig::default(),
            catalog_path: None,
            default_per_page: 20,
            max_per_page: 100,
            seed: None,
        }
    }
}

impl ServiceConfig {
    /// Load and validate a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate YAML text
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = if yaml.trim().is_empty() {
            ServiceConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.default_per_page == 0 || self.default_per_page > self.max_per_page {
            return Err(ConfigError::Invalid {
                field: "default_per_page",
                reason: format!(
                    "{} must be between 1 and max_per_page ({})",
                    self.default_per_page, self.max_per_page
                ),
            });
        }
        Ok(())
    }
}
