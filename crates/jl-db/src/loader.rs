//! Schema creation and fixture loading
//!
//! Every load starts from scratch: relations are dropped in reverse load
//! order, recreated from their definitions and filled from the selected
//! fixture source. Loading twice leaves the database in the same state.

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use jl_core::schema::{flatten_select_sql, RelationDef, RelationKind, RELATIONS};
use jl_core::sql_utils::quote_ident;
use std::fmt;
use std::path::{Path, PathBuf};

/// Sample rows inserted into the normalized relations by `FixtureSource::BuiltIn`
pub const BUILTIN_ROWS: &str = include_str!("../fixtures/sample_rows.sql");

/// Where fixture rows come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureSource {
    /// The embedded sample-row script
    BuiltIn,
    /// A directory holding `<relation>.csv` files
    Directory(PathBuf),
}

impl FixtureSource {
    /// Directory source when a path is given, built-in rows otherwise
    pub fn from_option(dir: Option<PathBuf>) -> Self {
        dir.map_or(FixtureSource::BuiltIn, FixtureSource::Directory)
    }

    fn csv_path(&self, relation: &RelationDef) -> Option<PathBuf> {
        match self {
            FixtureSource::BuiltIn => None,
            FixtureSource::Directory(dir) => Some(dir.join(format!("{}.csv", relation.name))),
        }
    }
}

impl fmt::Display for FixtureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureSource::BuiltIn => write!(f, "built-in sample rows"),
            FixtureSource::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// How a relation's rows were produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrigin {
    BuiltIn,
    Csv,
    /// Derived from the normalized relations by the flatten join
    Flattened,
    /// No CSV was found; the relation is empty
    Missing,
}

impl fmt::Display for RowOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowOrigin::BuiltIn => write!(f, "built-in"),
            RowOrigin::Csv => write!(f, "csv"),
            RowOrigin::Flattened => write!(f, "flattened"),
            RowOrigin::Missing => write!(f, "missing"),
        }
    }
}

/// Row count of one loaded relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationCount {
    pub name: &'static str,
    pub kind: RelationKind,
    pub rows: usize,
    pub origin: RowOrigin,
}

/// Outcome of a fixture load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureStats {
    /// Per-relation counts, in load order
    pub relations: Vec<RelationCount>,
}

impl FixtureStats {
    /// Row count of a relation, if it was loaded
    pub fn rows(&self, name: &str) -> Option<usize> {
        self.relations
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.rows)
    }

    /// Total rows across all relations
    pub fn total_rows(&self) -> usize {
        self.relations.iter().map(|r| r.rows).sum()
    }
}

/// Drop, create and fill every supermarket relation.
///
/// Constraint violations and unreadable CSV files are returned as errors.
/// A CSV file that does not exist leaves its relation empty.
pub async fn load_fixtures(db: &dyn Database, source: &FixtureSource) -> DbResult<FixtureStats> {
    log::debug!("Loading fixtures from {} into {}", source, db.db_type());

    for relation in RELATIONS.iter().rev() {
        db.drop_if_exists(relation.name).await?;
    }

    let ddl: Vec<String> = RELATIONS.iter().map(|r| r.create_table_sql()).collect();
    db.execute_batch(&ddl.join(";\n")).await?;

    let mut origins: Vec<(&'static RelationDef, RowOrigin)> = Vec::with_capacity(RELATIONS.len());

    if *source == FixtureSource::BuiltIn {
        db.execute_batch(BUILTIN_ROWS)
            .await
            .map_err(|e| DbError::FixtureError {
                relation: "built-in sample rows".to_string(),
                message: e.to_string(),
            })?;
    }

    for relation in RELATIONS.iter() {
        let origin = match (relation.kind, source.csv_path(relation)) {
            (_, Some(path)) if path.is_file() => {
                load_relation_csv(db, relation, &path).await?;
                RowOrigin::Csv
            }
            (RelationKind::Denormalized, _) => {
                flatten(db, relation).await?;
                RowOrigin::Flattened
            }
            (RelationKind::Normalized, Some(path)) => {
                log::warn!(
                    "No fixture file {} - relation '{}' is left empty",
                    path.display(),
                    relation.name
                );
                RowOrigin::Missing
            }
            (RelationKind::Normalized, None) => RowOrigin::BuiltIn,
        };
        origins.push((relation, origin));
    }

    let mut relations = Vec::with_capacity(origins.len());
    for (relation, origin) in origins {
        let rows = db
            .query_count(&format!("SELECT * FROM {}", quote_ident(relation.name)))
            .await?;
        log::debug!("Loaded {} rows into '{}' ({})", rows, relation.name, origin);
        relations.push(RelationCount {
            name: relation.name,
            kind: relation.kind,
            rows,
            origin,
        });
    }

    Ok(FixtureStats { relations })
}

async fn load_relation_csv(db: &dyn Database, relation: &RelationDef, path: &Path) -> DbResult<()> {
    let path_str = path.to_string_lossy();
    db.load_csv(relation.name, &path_str)
        .await
        .map_err(|e| DbError::FixtureError {
            relation: relation.name.to_string(),
            message: e.to_string(),
        })?;
    Ok(())
}

async fn flatten(db: &dyn Database, relation: &RelationDef) -> DbResult<()> {
    let sql = format!(
        "INSERT INTO {} BY NAME {}",
        quote_ident(relation.name),
        flatten_select_sql()
    );
    db.execute_batch(&sql)
        .await
        .map_err(|e| DbError::FixtureError {
            relation: relation.name.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
