#![forbid(unsafe_code)]

//! Undo settings loadable from TOML or JSON.
//!
//! ```toml
//! # beadline-undo.toml
//! granularity = "word"
//! max_stack_size = 500
//! verbose_groups = false
//! ```
//!
//! ```rust,ignore
//! let config = UndoConfig::from_toml_file("beadline-undo.toml")?;
//! undoer.reload_settings(config);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::typing::Granularity;

/// Configuration for an [`Undoer`](crate::Undoer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoConfig {
    /// How typing is split into beads.
    pub granularity: Granularity,
    /// Maximum number of undoable beads (0 = unlimited).
    pub max_stack_size: usize,
    /// Whether groups log their item count when replayed, unless overridden.
    pub verbose_groups: bool,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Line,
            max_stack_size: 0,
            verbose_groups: true,
        }
    }
}

impl UndoConfig {
    #[must_use]
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            ..Self::default()
        }
    }

    /// Cap the number of undoable beads.
    #[must_use]
    pub fn with_max_stack_size(mut self, max: usize) -> Self {
        self.max_stack_size = max;
        self
    }

    #[must_use]
    pub fn with_verbose_groups(mut self, verbose: bool) -> Self {
        self.verbose_groups = verbose;
        self
    }

    /// Unlimited history with default granularity.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}
