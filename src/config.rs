//! Seed configuration: initial values and errors loaded from JSON

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::form::{ErrorStore, FieldError, FieldPath, FormConfig, RuleSet, ValueStore};

/// Errors raised while loading or saving a seed file
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write seed to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse seed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Initial values and errors for a form.
///
/// List fields are written as `{"$list": [...]}`; error keys are field
/// paths such as `"name"` or `"contacts.0.email"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSeed {
    #[serde(default)]
    pub initial_values: ValueStore,
    #[serde(default)]
    pub initial_errors: BTreeMap<FieldPath, FieldError>,
}

impl FormSeed {
    /// Default seed file location
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "formstate", "formstate-demo")
            .map(|dirs| dirs.config_dir().join("seed.json"))
    }

    pub fn from_json(content: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, SeedError> {
        let content = fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let seed = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            fields = seed.initial_values.len(),
            "loaded form seed"
        );
        Ok(seed)
    }

    /// Load from `path` when it exists, otherwise return `None`
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>, SeedError> {
        if path.exists() {
            Self::load_from(path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SeedError> {
        let write_err = |source| SeedError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(write_err)
    }

    /// Construction input for a form validated by `rules`
    pub fn into_config(self, rules: RuleSet) -> FormConfig {
        let initial_errors =
            ErrorStore::from_entries_within(&self.initial_values, self.initial_errors);
        FormConfig {
            initial_values: self.initial_values,
            initial_errors,
            rules,
        }
    }
}
