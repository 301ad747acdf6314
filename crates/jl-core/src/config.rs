//! Configuration types and parsing for joinlab.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from joinlab.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    #[serde(default = "default_name")]
    pub name: String,

    /// Markdown file holding the query catalog
    #[serde(default = "default_catalog")]
    pub catalog: String,

    /// Directory of CSV fixtures. Built-in sample rows are used when unset.
    #[serde(default)]
    pub fixtures: Option<String>,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Absolute tolerance for numeric comparisons (AVG, derived totals)
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Maximum number of differing rows shown per entry
    #[serde(default = "default_max_diff_rows")]
    pub max_diff_rows: usize,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

const DEFAULT_DB_PATH: &str = ":memory:";

/// File names searched for by [`Config::load_from_dir`]
pub const CONFIG_FILE_NAMES: [&str; 2] = ["joinlab.yml", "joinlab.yaml"];

fn default_name() -> String {
    "joinlab".to_string()
}

fn default_catalog() -> String {
    "catalog.md".to_string()
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_tolerance() -> f64 {
    1e-6
}

fn default_max_diff_rows() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            catalog: default_catalog(),
            fixtures: None,
            database: DatabaseConfig::default(),
            tolerance: default_tolerance(),
            max_diff_rows: default_max_diff_rows(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory.
    ///
    /// Looks for joinlab.yml or joinlab.yaml and falls back to defaults
    /// when neither exists, so a bare directory with a catalog still works.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for file_name in CONFIG_FILE_NAMES {
            let path = dir.join(file_name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        log::debug!(
            "No {} in {}, using default configuration",
            CONFIG_FILE_NAMES[0],
            dir.display()
        );
        Ok(Self::default())
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.catalog.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "catalog path cannot be empty".to_string(),
            });
        }

        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "tolerance must be a finite, non-negative number, got {}",
                    self.tolerance
                ),
            });
        }

        Ok(())
    }

    /// Catalog path resolved against a project root
    pub fn catalog_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.catalog)
    }

    /// Fixture directory resolved against a project root, if configured
    pub fn fixtures_path_absolute(&self, root: &Path) -> Option<PathBuf> {
        self.fixtures.as_ref().map(|dir| root.join(dir))
    }

    /// Database path, resolving file paths against a project root.
    ///
    /// `:memory:` is returned unchanged.
    pub fn database_path(&self, root: &Path) -> String {
        if self.database.path == DEFAULT_DB_PATH {
            DEFAULT_DB_PATH.to_string()
        } else {
            root.join(&self.database.path).display().to_string()
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
