//! Runtime configuration loaded from TOML.
//!
//! ```toml
//! [agent_loop]
//! max_turns = 10
//!
//! [retry]
//! max_retries = 2
//! backoff_ms = 200
//! ```
//!
//! Every section and field is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use switchyard_contracts::error::{SwitchyardError, SwitchyardResult};

use crate::retry::RetryPolicy;

/// Default bound on deliberate steps per agent-loop run.
pub const DEFAULT_MAX_TURNS: u32 = 10;

fn default_max_turns() -> u32 {
    DEFAULT_MAX_TURNS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopConfig {
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self { max_turns: DEFAULT_MAX_TURNS }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub agent_loop: LoopConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl RuntimeConfig {
    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// `ConfigError` if the TOML is malformed or `max_turns` is zero.
    pub fn from_toml_str(s: &str) -> SwitchyardResult<Self> {
        let config: RuntimeConfig = toml::from_str(s).map_err(|e| SwitchyardError::ConfigError {
            reason: format!("failed to parse runtime TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as runtime configuration.
    pub fn from_file(path: &Path) -> SwitchyardResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SwitchyardError::ConfigError {
            reason: format!("failed to read runtime config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> SwitchyardResult<()> {
        if self.agent_loop.max_turns == 0 {
            return Err(SwitchyardError::config("agent_loop.max_turns must be at least 1"));
        }
        Ok(())
    }
}
