//! Check command implementation

use anyhow::{Context, Result};
use jl_check::{
    fixture_invariants, render_json, render_text, CatalogRunner, CheckReport, InvariantRunner,
    ReportOptions, RunOptions,
};
use jl_db::load_fixtures;

use crate::cli::{CheckArgs, CheckOutput, GlobalArgs};
use crate::commands::common::ExitCode;
use crate::context::{split_list, RuntimeContext};

/// Execute the check command
pub(crate) async fn execute(args: &CheckArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let catalog = ctx.load_catalog(args.catalog.as_deref())?;
    let ids = split_list(args.entries.as_deref());
    let entries = catalog.select(&ids).context("Invalid --entries selection")?;

    let db = ctx.open_database()?;
    let source = ctx.fixture_source(args.fixtures.as_deref());
    let stats = load_fixtures(db.as_ref(), &source)
        .await
        .context("Failed to load fixtures")?;
    log::info!(
        "Loaded {} rows into {} relations from {}",
        stats.total_rows(),
        stats.relations.len(),
        source
    );

    let options = ReportOptions {
        timings: args.timings,
        max_diff_rows: ctx.config.max_diff_rows,
    };

    let (invariants, invariant_summary) = InvariantRunner::new(db.as_ref(), options.max_diff_rows)
        .run_all(&fixture_invariants())
        .await;

    let runner = CatalogRunner::new(
        db.as_ref(),
        RunOptions {
            tolerance: ctx.config.tolerance,
            fail_fast: args.fail_fast,
        },
    );
    let (results, summary) = runner.run_all(&entries).await;

    let report = CheckReport {
        invariants: &invariants,
        invariant_summary: &invariant_summary,
        entries: &results,
        summary: &summary,
    };

    match args.output {
        CheckOutput::Text => print!("{}", render_text(&report, &options)),
        CheckOutput::Json => {
            let json = render_json(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }
    }

    if !summary.all_passed() || !invariant_summary.all_passed() {
        // Exit code 2 = validation failures
        return Err(ExitCode(2).into());
    }

    Ok(())
}
