//! Integration tests for Joinlab

use jl_check::{
    fixture_invariants, CatalogRunner, EntryStatus, InvariantRunner, RunOptions,
};
use jl_core::{Catalog, Config, Expectation};
use jl_db::{load_fixtures, Cell, DuckDbBackend, FixtureSource, RowOrigin};
use std::path::{Path, PathBuf};
use std::process::Command;

const PROJECT: &str = "tests/fixtures/supermarket_project";
const BROKEN_PROJECT: &str = "tests/fixtures/broken_project";
const CSV_FIXTURES: &str = "tests/fixtures/supermarket_csv";
const BAD_ROWS: &str = "tests/fixtures/bad_rows";

fn jl_bin() -> String {
    env!("CARGO_BIN_EXE_jl").to_string()
}

/// Run a `jl` CLI command and return (stdout, stderr, exit code).
fn run_jl(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(jl_bin())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute jl with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

fn load_project_catalog() -> (Config, Catalog) {
    let root = Path::new(PROJECT);
    let config = Config::load_from_dir(root).unwrap();
    let catalog = Catalog::load(&config.catalog_path_absolute(root)).unwrap();
    (config, catalog)
}

/// Test loading the sample project configuration and catalog
#[test]
fn test_load_sample_project() {
    let (config, catalog) = load_project_catalog();

    assert_eq!(config.name, "supermarket_tutorial");
    assert_eq!(config.max_diff_rows, 3);
    assert_eq!(catalog.entries.len(), 8);
    assert!(catalog.issues.is_empty(), "{:?}", catalog.issues);

    let never = catalog
        .get("which-customers-have-never-made-a-purchase")
        .unwrap();
    assert_eq!(never.expectation, Expectation::NotRepresentable);
    assert!(never.denormalized.is_none());
}

/// Test the whole catalog against the built-in rows
#[tokio::test]
async fn test_catalog_passes_on_builtin_rows() {
    let (config, catalog) = load_project_catalog();
    let db = DuckDbBackend::in_memory().unwrap();
    load_fixtures(&db, &FixtureSource::BuiltIn).await.unwrap();

    let runner = CatalogRunner::new(
        &db,
        RunOptions {
            tolerance: config.tolerance,
            fail_fast: false,
        },
    );
    let entries = catalog.select(&[]).unwrap();
    let (results, summary) = runner.run_all(&entries).await;

    for result in &results {
        assert!(
            !result.is_failure(),
            "{} failed: {:?} {:?}",
            result.id,
            result.reason,
            result.errors
        );
    }
    assert_eq!(summary.passed, 5);
    assert_eq!(summary.not_representable, 2);
    assert_eq!(summary.skipped, 1);
    assert!(summary.all_passed());

    let never = results
        .iter()
        .find(|r| r.id == "which-customers-have-never-made-a-purchase")
        .unwrap();
    assert_eq!(
        never.omitted_rows,
        vec![vec![
            Cell::Int(6),
            Cell::Text("Donald".to_string()),
            Cell::Text("Knuth".to_string())
        ]]
    );

    let unsold = results
        .iter()
        .find(|r| r.id == "which-products-have-never-been-sold")
        .unwrap();
    assert_eq!(unsold.status, EntryStatus::NotRepresentable);
    assert_eq!(unsold.denormalized_rows, Some(0));
    assert_eq!(unsold.omitted_rows.len(), 1);
}

/// Test the same catalog against CSV fixtures with a flattened relation
#[tokio::test]
async fn test_catalog_passes_on_csv_fixtures() {
    let (_, catalog) = load_project_catalog();
    let db = DuckDbBackend::in_memory().unwrap();
    let stats = load_fixtures(&db, &FixtureSource::Directory(PathBuf::from(CSV_FIXTURES)))
        .await
        .unwrap();

    assert_eq!(stats.rows("customer"), Some(3));
    assert_eq!(stats.rows("cart"), Some(4));
    assert_eq!(stats.rows("supermarket_transactions"), Some(4));
    assert_eq!(
        stats.relations.last().map(|r| r.origin),
        Some(RowOrigin::Flattened)
    );

    let (_, invariant_summary) = InvariantRunner::new(&db, 5)
        .run_all(&fixture_invariants())
        .await;
    assert!(invariant_summary.all_passed());

    let runner = CatalogRunner::new(&db, RunOptions::default());
    let entries = catalog.select(&[]).unwrap();
    let (results, summary) = runner.run_all(&entries).await;
    assert!(summary.all_passed(), "{:?}", results);

    let never = results
        .iter()
        .find(|r| r.id == "which-customers-have-never-made-a-purchase")
        .unwrap();
    assert_eq!(never.omitted_rows[0][0], Cell::Int(3));
}

/// Test that broken denormalized queries are reported per entry
#[tokio::test]
async fn test_broken_catalog_statuses() {
    let catalog = Catalog::load(&Path::new(BROKEN_PROJECT).join("catalog.md")).unwrap();
    let db = DuckDbBackend::in_memory().unwrap();
    load_fixtures(&db, &FixtureSource::BuiltIn).await.unwrap();

    let runner = CatalogRunner::new(&db, RunOptions::default());
    let entries = catalog.select(&[]).unwrap();
    let (results, summary) = runner.run_all(&entries).await;

    let statuses: Vec<EntryStatus> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![EntryStatus::Failed, EntryStatus::Passed, EntryStatus::Error]
    );
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors, 1);
    assert!(results[2].errors[0].to_string().contains("denormalized"));
}

#[test]
fn test_cli_check_passing_project() {
    let (stdout, stderr, code) = run_jl(&["check", "-p", PROJECT]);
    assert_eq!(code, 0, "stdout: {}\nstderr: {}", stdout, stderr);
    assert!(stdout.contains("Checking 8 catalog entries..."));
    assert!(stdout.contains("✓ how-much-has-each-customer-spent"));
    assert!(stdout.contains("Passed: 5, Failed: 0, Errors: 0, Not representable: 2, Skipped: 1"));
}

#[test]
fn test_cli_check_csv_fixtures() {
    let (stdout, stderr, code) = run_jl(&["check", "-p", PROJECT, "--fixtures", CSV_FIXTURES]);
    assert_eq!(code, 0, "stdout: {}\nstderr: {}", stdout, stderr);
}

#[test]
fn test_cli_check_failures_exit_2() {
    let (stdout, _, code) = run_jl(&["check", "-p", BROKEN_PROJECT]);
    assert_eq!(code, 2);
    assert!(stdout.contains("✗ how-many-customers-are-there"));
    assert!(stdout.contains("Passed: 1, Failed: 1, Errors: 1"));
}

#[test]
fn test_cli_check_fail_fast_stops_early() {
    let (stdout, _, code) = run_jl(&["check", "-p", BROKEN_PROJECT, "--fail-fast"]);
    assert_eq!(code, 2);
    assert!(stdout.contains("Not run: 2"));
}

#[test]
fn test_cli_check_selected_entries() {
    let (stdout, _, code) = run_jl(&[
        "check",
        "-p",
        BROKEN_PROJECT,
        "-e",
        "how-many-lines-does-each-transaction-have",
    ]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Checking 1 catalog entries..."));

    let (_, stderr, code) = run_jl(&["check", "-p", BROKEN_PROJECT, "-e", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nope"));
}

#[test]
fn test_cli_check_json_output() {
    let (stdout, _, code) = run_jl(&["check", "-p", BROKEN_PROJECT, "-o", "json"]);
    assert_eq!(code, 2);

    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["summary"]["failed"], 1);
    assert_eq!(report["summary"]["errors"], 1);
    assert_eq!(report["entries"][0]["status"], "failed");
    assert_eq!(report["entries"][2]["status"], "error");
    assert_eq!(report["invariant_summary"]["failed"], 0);
}

#[test]
fn test_cli_check_output_is_deterministic() {
    let first = run_jl(&["check", "-p", BROKEN_PROJECT]);
    let second = run_jl(&["check", "-p", BROKEN_PROJECT]);
    assert_eq!(first.0, second.0);
}

#[test]
fn test_cli_missing_catalog_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().to_string_lossy().to_string();
    let (_, stderr, code) = run_jl(&["check", "-p", &project]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("Error:"), "{}", stderr);
}

#[test]
fn test_cli_ls_json() {
    let (stdout, _, code) = run_jl(&["ls", "-p", PROJECT, "-o", "json"]);
    assert_eq!(code, 0);

    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 8);
    assert_eq!(entries[0]["id"], "how-much-has-each-customer-spent");
}

#[test]
fn test_cli_ls_table() {
    let (stdout, _, code) = run_jl(&["ls", "-p", PROJECT]);
    assert_eq!(code, 0);
    assert!(stdout.contains("8 entries found"));
}

#[test]
fn test_cli_seed_builtin_rows() {
    let (stdout, stderr, code) = run_jl(&["seed", "-p", PROJECT]);
    assert_eq!(code, 0, "stdout: {}\nstderr: {}", stdout, stderr);
    assert!(stdout.contains("✓ cart (16 rows, normalized, built-in)"));
    assert!(stdout.contains("✓ supermarket_transactions (16 rows, denormalized, flattened)"));
    assert!(stdout.contains("Failed: 0"));
}

#[test]
fn test_cli_seed_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("tutorial.duckdb");
    let target = db_path.to_string_lossy().to_string();

    let (_, _, code) = run_jl(&["seed", "-p", PROJECT, "-t", &target, "--fixtures", CSV_FIXTURES]);
    assert_eq!(code, 0);
    assert!(db_path.exists());
}

#[test]
fn test_cli_seed_invariant_violations_exit_4() {
    let (stdout, _, code) = run_jl(&["seed", "-p", PROJECT, "--fixtures", BAD_ROWS]);
    assert_eq!(code, 4);
    assert!(stdout.contains("positive_supermarket_transactions_quantity"));
    assert!(stdout.contains("unique_supermarket_transactions_purchase_id"));
}

#[test]
fn test_cli_validate_passing_project() {
    let (stdout, _, code) = run_jl(&["validate", "-p", PROJECT]);
    assert_eq!(code, 0, "{}", stdout);
    assert!(stdout.contains("Validation passed for 8 entries: 0 errors, 0 warnings"));
}

#[test]
fn test_cli_validate_reports_errors() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("catalog.md"),
        "## Q\n\n```sql\nSELECT * FROM cart\n```\n\n```sql\nSELECT * FROM cart JOIN customer USING (customer_id)\n```\n\n## R\n\n```sql\nSELECT * FROM orders\n```\n\n```sql\nSELECT * FROM supermarket_transactions\n```\n",
    )
    .unwrap();
    let project = dir.path().to_string_lossy().to_string();

    let (stdout, _, code) = run_jl(&["validate", "-p", &project]);
    assert_eq!(code, 1);
    assert!(stdout.contains("[ERROR] V003"));
    assert!(stdout.contains("[WARNING] V005"));
    assert!(stdout.contains("Validation failed: 2 errors, 1 warnings"));
}

#[test]
fn test_cli_validate_strict_fails_on_warnings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("catalog.md"),
        "## Q\n\n```sql\nSELECT * FROM cart\n```\n",
    )
    .unwrap();
    let project = dir.path().to_string_lossy().to_string();

    let (_, _, code) = run_jl(&["validate", "-p", &project]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_jl(&["validate", "-p", &project, "--strict"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("Validation failed (strict mode): 0 errors, 1 warnings"));
}
