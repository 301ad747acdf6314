//! Runtime context for CLI commands

use anyhow::{Context, Result};
use jl_core::{Catalog, Config};
use jl_db::{Database, DuckDbBackend, FixtureSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Loaded configuration plus the project directory it resolves against
pub(crate) struct RuntimeContext {
    /// Project directory
    pub root: PathBuf,

    /// Effective configuration
    pub config: Config,

    /// `--target` override of the database path
    target: Option<String>,
}

impl RuntimeContext {
    /// Create a new runtime context from global arguments
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&args.project_dir);

        let config = if let Some(config_path) = &args.config {
            Config::load(Path::new(config_path)).context("Failed to load configuration file")?
        } else {
            Config::load_from_dir(&root).context("Failed to load project configuration")?
        };
        log::debug!("Using project '{}' at {}", config.name, root.display());

        Ok(Self {
            root,
            config,
            target: args.target.clone(),
        })
    }

    /// Load the catalog, preferring a `--catalog` path over the config
    pub fn load_catalog(&self, catalog_arg: Option<&str>) -> Result<Catalog> {
        let path = match catalog_arg {
            Some(path) => PathBuf::from(path),
            None => self.config.catalog_path_absolute(&self.root),
        };
        let catalog = Catalog::load(&path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?;
        for issue in &catalog.issues {
            log::warn!("{}: {}", path.display(), issue);
        }
        Ok(catalog)
    }

    /// Fixture source, preferring a `--fixtures` directory over the config
    pub fn fixture_source(&self, fixtures_arg: Option<&str>) -> FixtureSource {
        let dir = match fixtures_arg {
            Some(dir) => Some(PathBuf::from(dir)),
            None => self.config.fixtures_path_absolute(&self.root),
        };
        FixtureSource::from_option(dir)
    }

    /// Open the target database
    pub fn open_database(&self) -> Result<Arc<dyn Database>> {
        let db_path = match &self.target {
            Some(target) => target.clone(),
            None => self.config.database_path(&self.root),
        };
        log::debug!("Opening database {}", db_path);
        let db: Arc<dyn Database> =
            Arc::new(DuckDbBackend::new(&db_path).context("Failed to connect to database")?);
        Ok(db)
    }
}

/// Split a comma-separated list argument
pub(crate) fn split_list(arg: Option<&str>) -> Vec<String> {
    arg.map(|list| {
        list.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
