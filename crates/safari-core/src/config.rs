//! Run configuration: seeds, lane counts, episode limits.
//!
//! Construction-time validation is eager: a malformed config fails before
//! any environment is built, never mid-episode.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_num_envs() -> u16 {
    1
}
const fn default_max_episode_steps() -> u32 {
    1000
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Top-level run configuration.
///
/// # Example
///
/// ```
/// use safari_core::config::RunConfig;
///
/// let cfg: RunConfig = toml::from_str("seed = 7\nnum_envs = 4").unwrap();
/// cfg.validate().unwrap();
/// assert_eq!(cfg.num_envs, 4);
/// assert_eq!(cfg.max_episode_steps, 1000); // default
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Master random seed. All lane and episode seeds derive from it.
    #[serde(default)]
    pub seed: u64,

    /// Number of parallel lanes for vectorized execution (default: 1).
    #[serde(default = "default_num_envs")]
    pub num_envs: u16,

    /// Maximum steps per episode before truncation (default: 1000).
    #[serde(default = "default_max_episode_steps")]
    pub max_episode_steps: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_envs: default_num_envs(),
            max_episode_steps: default_max_episode_steps(),
        }
    }
}

impl RunConfig {
    /// Load a config from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_envs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "num_envs".into(),
                message: "must be >= 1".into(),
            });
        }
        if self.max_episode_steps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_episode_steps".into(),
                message: "must be >= 1".into(),
            });
        }
        Ok(())
    }

    /// Builder: set the master seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: set the lane count.
    #[must_use]
    pub const fn with_num_envs(mut self, num_envs: u16) -> Self {
        self.num_envs = num_envs;
        self
    }

    /// Builder: set the per-episode step limit.
    #[must_use]
    pub const fn with_max_steps(mut self, steps: u32) -> Self {
        self.max_episode_steps = steps;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RunConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.num_envs, 1);
        assert_eq!(cfg.max_episode_steps, 1000);
    }

    #[test]
    fn toml_roundtrip_with_defaults() {
        let cfg: RunConfig = toml::from_str("seed = 42").unwrap();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.num_envs, 1);
    }

    #[test]
    fn zero_num_envs_rejected() {
        let cfg = RunConfig::default().with_num_envs(0);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("num_envs"));
    }

    #[test]
    fn zero_step_limit_rejected() {
        let cfg = RunConfig::default().with_max_steps(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn builder_chains() {
        let cfg = RunConfig::default()
            .with_seed(9)
            .with_num_envs(8)
            .with_max_steps(250);
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.num_envs, 8);
        assert_eq!(cfg.max_episode_steps, 250);
    }
}
