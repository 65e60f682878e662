//! Runtime configuration.
//!
//! A small YAML document; every field has a default so an empty file (or no
//! file at all) yields a working config.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_TURNS: usize = 30;
pub const DEFAULT_SERVER_URL: &str = "http://localhost:4096";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Upper bound on backend exchanges per run.
    pub max_turns: usize,
    /// Model override passed through to the backend, when set.
    pub model: Option<String>,
    /// Surface reasoning parts in turn records.
    pub include_reasoning: bool,
    pub server_url: String,
    /// Where session snapshots are stored, when persistence is used.
    pub sessions_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            model: None,
            include_reasoning: false,
            server_url: DEFAULT_SERVER_URL.to_string(),
            sessions_dir: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml_str(body: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(body)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path)?;
        Self::from_yaml_str(&body)
    }
}
