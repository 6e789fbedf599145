//! Synchronization settings.

use crate::core::ViewType;
use crate::doc::BoundaryRule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// View type for pages that do not set one.
    pub default_view_type: ViewType,
    /// Offset shifting rule used when rendering annotations back to markup.
    pub boundary_rule: BoundaryRule,
}

impl SyncConfig {
    /// Renders markup with the historic boundary rule, for peers that expect
    /// byte-identical output from older codecs.
    pub fn legacy() -> Self {
        Self {
            boundary_rule: BoundaryRule::Legacy,
            ..Self::default()
        }
    }

    pub fn with_default_view_type(mut self, view_type: ViewType) -> Self {
        self.default_view_type = view_type;
        self
    }

    /// Loads a JSON config file. Missing keys take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_view_type: ViewType::Bullet,
            boundary_rule: BoundaryRule::Nesting,
        }
    }
}
