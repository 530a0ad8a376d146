//! Explorer configuration.
//!
//! Read from `$XDG_CONFIG_HOME/burrow/config.toml`:
//!
//! ```toml
//! start_path = "/home/amy/projects"
//! history_limit = 200
//! ```
//!
//! Every key is optional. A missing file means defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::paths;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorerConfig {
    /// Directory shown at startup. Defaults to the home directory, then `/`.
    pub start_path: Option<PathBuf>,
    /// Maximum number of history entries; unbounded if unset.
    pub history_limit: Option<usize>,
}

impl ExplorerConfig {
    /// A config that starts at `path` and ignores the user's config file.
    pub fn isolated(path: impl Into<PathBuf>) -> Self {
        Self {
            start_path: Some(path.into()),
            history_limit: None,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid burrow config")
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };
        Self::from_toml_str(&text).with_context(|| format!("loading {}", path.display()))
    }

    /// Load the user's config file.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&paths::config_file())
    }

    /// The directory the explorer should open first.
    pub fn resolved_start_path(&self) -> PathBuf {
        self.start_path
            .clone()
            .or_else(paths::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"))
    }
}
