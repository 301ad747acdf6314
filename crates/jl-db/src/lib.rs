//! jl-db - Database layer for Joinlab
//!
//! This crate provides the `Database` trait, its DuckDB implementation,
//! the result-set model shared by the checker, and the loader that
//! creates the supermarket relations and fills them with fixture rows.

pub mod duckdb;
pub mod error;
pub mod loader;
pub mod result;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use loader::{load_fixtures, FixtureSource, FixtureStats, RelationCount, RowOrigin};
pub use result::{Cell, ResultSet};
pub use traits::Database;
