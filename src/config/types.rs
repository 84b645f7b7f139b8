//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backend used when neither the config file nor `API_ROOT` names one.
pub const DEFAULT_API_ROOT: &str = "https://app-pql6sv7epq-uc.a.run.app";

/// Environment variable overriding the backend root.
pub const API_ROOT_ENV: &str = "API_ROOT";

/// Agent configuration loaded from TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Backend root URL.
    pub api_root: String,
    /// Fixed delay before reconnecting to the node.
    pub reconnect_delay_secs: u64,
    /// Interval between new-block checks.
    pub poll_interval_ms: u64,
    /// Upload contract ASTs for storage decoding.
    pub ast_upload: bool,
    /// Project directories to watch when none are given on the command line.
    pub directories: Vec<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            reconnect_delay_secs: 5,
            poll_interval_ms: 1000,
            ast_upload: false,
            directories: vec![PathBuf::from(".")],
        }
    }
}

impl AgentConfig {
    /// Apply environment overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(api_root) = std::env::var(API_ROOT_ENV) {
            if !api_root.trim().is_empty() {
                self.api_root = api_root;
            }
        }
        self
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
