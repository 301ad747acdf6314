//! Validate command implementation

use anyhow::Result;
use jl_core::schema::{relation, RelationKind};
use jl_core::{CatalogEntry, Expectation};
use jl_sql::{QueryShape, SqlParser};
use std::path::PathBuf;

use crate::cli::{GlobalArgs, ValidateArgs};
use crate::commands::common::ExitCode;
use crate::context::RuntimeContext;

/// Validation issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single validation issue
struct ValidationIssue {
    severity: Severity,
    code: String,
    message: String,
    location: Option<String>,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(
                f,
                "[{}] {}: {} ({})",
                self.severity, self.code, self.message, location
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.code, self.message),
        }
    }
}

/// Collect validation issues
struct ValidationContext {
    issues: Vec<ValidationIssue>,
    catalog_path: String,
}

impl ValidationContext {
    fn new(catalog_path: String) -> Self {
        Self {
            issues: Vec::new(),
            catalog_path,
        }
    }

    fn location(&self, line: usize) -> Option<String> {
        Some(format!("{}:{}", self.catalog_path, line))
    }

    fn error(&mut self, code: &str, message: impl Into<String>, line: usize) {
        let location = self.location(line);
        self.issues.push(ValidationIssue {
            severity: Severity::Error,
            code: code.to_string(),
            message: message.into(),
            location,
        });
    }

    fn warning(&mut self, code: &str, message: impl Into<String>, line: usize) {
        let location = self.location(line);
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.into(),
            location,
        });
    }

    fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }
}

/// Execute the validate command
pub(crate) async fn execute(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let catalog_path = match &args.catalog {
        Some(path) => PathBuf::from(path),
        None => ctx.config.catalog_path_absolute(&ctx.root),
    };
    let catalog = ctx.load_catalog(args.catalog.as_deref())?;

    println!("Validating catalog: {}\n", catalog_path.display());

    let mut vctx = ValidationContext::new(catalog_path.display().to_string());
    for issue in &catalog.issues {
        vctx.warning("V001", issue.message.clone(), issue.line);
    }

    let parser = SqlParser::duckdb();
    for entry in &catalog.entries {
        validate_entry(entry, &parser, &mut vctx);
    }

    print_issues_and_summary(&vctx, catalog.entries.len(), args.strict)
}

/// Parse both queries of an entry and check which relations they read
fn validate_entry(entry: &CatalogEntry, parser: &SqlParser, vctx: &mut ValidationContext) {
    let normalized = parse_side(entry, "normalized", &entry.normalized, parser, vctx);
    if let Some(shape) = &normalized {
        check_relations(entry, "normalized", shape, RelationKind::Denormalized, vctx);
    }

    match &entry.denormalized {
        Some(sql) => {
            if let Some(shape) = parse_side(entry, "denormalized", sql, parser, vctx) {
                check_relations(entry, "denormalized", &shape, RelationKind::Normalized, vctx);
            }
        }
        None if entry.expectation == Expectation::Equivalent && !entry.skip => {
            vctx.warning(
                "V006",
                format!(
                    "Entry '{}' has no denormalized query and will be skipped",
                    entry.id
                ),
                entry.line,
            );
        }
        None => {}
    }
}

fn parse_side(
    entry: &CatalogEntry,
    side: &str,
    sql: &str,
    parser: &SqlParser,
    vctx: &mut ValidationContext,
) -> Option<QueryShape> {
    match parser.parse_query(sql) {
        Ok(shape) => Some(shape),
        Err(e) => {
            vctx.error(
                "V002",
                format!("{} query of '{}': {}", side, entry.id, e),
                entry.line,
            );
            None
        }
    }
}

/// Flag relations from the other schema (`foreign`) and unknown relations
fn check_relations(
    entry: &CatalogEntry,
    side: &str,
    shape: &QueryShape,
    foreign: RelationKind,
    vctx: &mut ValidationContext,
) {
    for name in &shape.relations {
        match relation(name) {
            Ok(def) if def.kind == foreign && foreign == RelationKind::Normalized => {
                vctx.error(
                    "V003",
                    format!(
                        "denormalized query of '{}' reads normalized relation '{}'",
                        entry.id, name
                    ),
                    entry.line,
                );
            }
            Ok(def) if def.kind == foreign => {
                vctx.warning(
                    "V004",
                    format!(
                        "normalized query of '{}' reads the denormalized relation '{}'",
                        entry.id, name
                    ),
                    entry.line,
                );
            }
            Ok(_) => {}
            Err(_) => {
                vctx.warning(
                    "V005",
                    format!(
                        "{} query of '{}' reads unknown relation '{}'",
                        side, entry.id, name
                    ),
                    entry.line,
                );
            }
        }
    }
}

/// Print all issues and final summary
fn print_issues_and_summary(vctx: &ValidationContext, entries: usize, strict: bool) -> Result<()> {
    for issue in &vctx.issues {
        println!("{}", issue);
    }

    let error_count = vctx.error_count();
    let warning_count = vctx.warning_count();

    if !vctx.issues.is_empty() {
        println!();
    }
    if error_count == 0 && (warning_count == 0 || !strict) {
        println!(
            "Validation passed for {} entries: {} errors, {} warnings",
            entries, error_count, warning_count
        );
        Ok(())
    } else if strict && error_count == 0 {
        println!(
            "Validation failed (strict mode): {} errors, {} warnings",
            error_count, warning_count
        );
        Err(ExitCode(1).into())
    } else {
        println!(
            "Validation failed: {} errors, {} warnings",
            error_count, warning_count
        );
        Err(ExitCode(1).into())
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
