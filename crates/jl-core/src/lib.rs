//! jl-core - Core library for Joinlab
//!
//! This crate provides the shared types used across all Joinlab
//! components: project configuration, the supermarket relation
//! definitions, and the query catalog extracted from tutorial markdown.

pub mod catalog;
pub mod config;
pub mod error;
pub mod schema;
pub mod sql_utils;

pub use catalog::{Catalog, CatalogEntry, CatalogIssue, Directive, Expectation, OrderingHint};
pub use config::Config;
pub use error::CoreError;
pub use schema::{ColumnCheck, ColumnDef, RelationDef, RelationKind};
