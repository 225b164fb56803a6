//! Search configuration.
//!
//! Controls which columns the keyword search touches and the paging
//! defaults. Stored in TOML at `~/.config/properti-search/search.toml`
//! (or the platform equivalent).
//!
//! # Example Configuration
//!
//! ```toml
//! phrase_columns = ["code", "title", "description", "property_type",
//!                   "status", "address", "city", "province"]
//! word_columns = ["code", "title", "description", "city", "province"]
//! min_word_len = 3
//! page_size = 12
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::search::builder::SearchColumns;
use crate::search::predicate::ListingColumn;

/// Errors that can occur when loading or saving search configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Logical column names the full phrase is matched against.
    #[serde(default = "default_phrase_columns")]
    pub phrase_columns: Vec<String>,
    /// Logical column names individual words are matched against.
    #[serde(default = "default_word_columns")]
    pub word_columns: Vec<String>,
    /// Minimum word length (chars) for per-word expansion.
    #[serde(default = "default_min_word_len")]
    pub min_word_len: usize,
    /// Default page size for CLI searches.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            phrase_columns: default_phrase_columns(),
            word_columns: default_word_columns(),
            min_word_len: default_min_word_len(),
            page_size: default_page_size(),
        }
    }
}

impl SearchConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.phrase_columns.is_empty() {
            return Err(ConfigError::Validation(
                "phrase_columns must not be empty".into(),
            ));
        }
        for name in self.phrase_columns.iter().chain(&self.word_columns) {
            if ListingColumn::parse(name).is_none() {
                return Err(ConfigError::Validation(format!(
                    "unknown search column `{name}`"
                )));
            }
        }
        if self.min_word_len == 0 {
            return Err(ConfigError::Validation("min_word_len must be >= 1".into()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Validation("page_size must be >= 1".into()));
        }
        Ok(())
    }

    /// Resolve the logical names into the column sets the builder takes.
    pub fn to_columns(&self) -> Result<SearchColumns, ConfigError> {
        self.validate()?;
        let resolve = |names: &[String]| -> Vec<ListingColumn> {
            names
                .iter()
                .filter_map(|n| ListingColumn::parse(n))
                .collect()
        };
        Ok(SearchColumns {
            phrase: resolve(&self.phrase_columns),
            word: resolve(&self.word_columns),
            min_word_len: self.min_word_len,
        })
    }
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    directories::ProjectDirs::from("com", "properti-search", "properti-search")
        .map(|dirs| dirs.config_dir().join("search.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

fn default_phrase_columns() -> Vec<String> {
    ListingColumn::ALL
        .iter()
        .map(|c| c.logical_name().to_string())
        .collect()
}

fn default_word_columns() -> Vec<String> {
    ["code", "title", "description", "city", "province"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_min_word_len() -> usize {
    3
}

fn default_page_size() -> u32 {
    12
}
