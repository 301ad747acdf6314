//! Ls command implementation

use anyhow::{Context, Result};
use jl_core::{CatalogEntry, Expectation, OrderingHint};
use jl_sql::{QueryShape, SqlParser};
use serde::Serialize;

use crate::cli::{GlobalArgs, LsArgs, LsOutput};
use crate::context::RuntimeContext;

/// Entry information for display
#[derive(Debug, Serialize)]
struct EntryInfo {
    id: String,
    question: String,
    line: usize,
    expectation: Expectation,
    ordering: String,
    skip: bool,
    has_denormalized: bool,
    /// Relations read by either query; queries that do not parse contribute none
    relations: Vec<String>,
}

fn ordering_label(hint: OrderingHint, shapes: &[Option<QueryShape>]) -> String {
    match hint {
        OrderingHint::Ordered => "ordered".to_string(),
        OrderingHint::Unordered => "unordered".to_string(),
        OrderingHint::Auto => {
            let all_ordered = shapes.len() == 2
                && shapes
                    .iter()
                    .all(|s| s.as_ref().is_some_and(|shape| shape.ordered));
            if all_ordered {
                "auto (ordered)".to_string()
            } else {
                "auto".to_string()
            }
        }
    }
}

fn entry_info(entry: &CatalogEntry, parser: &SqlParser) -> EntryInfo {
    let shapes: Vec<Option<QueryShape>> = std::iter::once(entry.normalized.as_str())
        .chain(entry.denormalized.as_deref())
        .map(|sql| parser.parse_query(sql).ok())
        .collect();

    let mut relations: Vec<String> = shapes
        .iter()
        .flatten()
        .flat_map(|shape| shape.relations.iter().cloned())
        .collect();
    relations.sort();
    relations.dedup();

    EntryInfo {
        id: entry.id.clone(),
        question: entry.question.clone(),
        line: entry.line,
        expectation: entry.expectation,
        ordering: ordering_label(entry.ordering, &shapes),
        skip: entry.skip,
        has_denormalized: entry.denormalized.is_some(),
        relations,
    }
}

/// Execute the ls command
pub(crate) async fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let catalog = ctx.load_catalog(args.catalog.as_deref())?;
    let parser = SqlParser::duckdb();

    let entries: Vec<EntryInfo> = catalog
        .entries
        .iter()
        .map(|entry| entry_info(entry, &parser))
        .collect();

    match args.output {
        LsOutput::Table => print_table(&entries),
        LsOutput::Json => print_json(&entries)?,
    }

    Ok(())
}

/// Print entries as a table
fn print_table(entries: &[EntryInfo]) {
    let id_width = entries
        .iter()
        .map(|e| e.id.len())
        .max()
        .unwrap_or(2)
        .max(2);
    let exp_width = 17;
    let ord_width = 14;

    println!(
        "{:<id_width$}  {:<exp_width$}  {:<ord_width$}  RELATIONS",
        "ID", "EXPECTATION", "ORDERING",
    );
    println!(
        "{:-<id_width$}  {:-<exp_width$}  {:-<ord_width$}  {}",
        "", "", "", "---------",
    );

    for entry in entries {
        let expectation = if entry.skip {
            format!("{} (skip)", entry.expectation)
        } else {
            entry.expectation.to_string()
        };
        println!(
            "{:<id_width$}  {:<exp_width$}  {:<ord_width$}  {}",
            entry.id,
            expectation,
            entry.ordering,
            entry.relations.join(", "),
        );
    }

    println!();
    println!("{} entries found", entries.len());
}

/// Print entries as JSON
fn print_json(entries: &[EntryInfo]) -> Result<()> {
    let json = serde_json::to_string_pretty(entries).context("Failed to serialize entries")?;
    println!("{}", json);
    Ok(())
}
