//! Seed command implementation

use anyhow::{Context, Result};
use jl_check::report::render_invariants;
use jl_check::{fixture_invariants, InvariantRunner, ReportOptions};
use jl_db::load_fixtures;

use crate::cli::{GlobalArgs, SeedArgs};
use crate::commands::common::ExitCode;
use crate::context::RuntimeContext;

/// Execute the seed command
pub(crate) async fn execute(args: &SeedArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let db = ctx.open_database()?;
    let source = ctx.fixture_source(args.fixtures.as_deref());

    println!("Loading fixtures from {}...\n", source);

    let stats = load_fixtures(db.as_ref(), &source)
        .await
        .context("Failed to load fixtures")?;

    for relation in &stats.relations {
        println!(
            "  ✓ {} ({} rows, {}, {})",
            relation.name, relation.rows, relation.kind, relation.origin
        );
    }
    println!();
    println!(
        "Loaded {} relations ({} total rows)\n",
        stats.relations.len(),
        stats.total_rows()
    );

    let options = ReportOptions {
        timings: global.verbose,
        max_diff_rows: ctx.config.max_diff_rows,
    };
    let (results, summary) = InvariantRunner::new(db.as_ref(), options.max_diff_rows)
        .run_all(&fixture_invariants())
        .await;

    println!("Checking {} fixture invariants...\n", results.len());
    print!("{}", render_invariants(&results, &summary, &options, false));

    if !summary.all_passed() {
        // Exit code 4 = fixture data violates the data model
        return Err(ExitCode(4).into());
    }

    Ok(())
}
