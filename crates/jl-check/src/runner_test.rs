use super::*;
use jl_core::Catalog;
use jl_db::{load_fixtures, DuckDbBackend, FixtureSource};

const CATALOG: &str = r#"# Supermarket

## How many units has each customer bought?

```sql
SELECT customer_id, SUM(quantity) AS units
FROM cart
GROUP BY customer_id
```

```sql
SELECT customer_id, SUM(quantity) AS units
FROM supermarket_transactions
GROUP BY customer_id
```

## Which customers have never made a purchase?

```sql
SELECT cu.customer_id, cu.first_name
FROM customer cu
LEFT JOIN cart c ON c.customer_id = cu.customer_id
WHERE c.purchase_id IS NULL
```

This cannot be performed on the denormalized schema.

## Which customers appear in the data?

<!-- joinlab: not-representable -->

```sql
SELECT customer_id FROM customer
```

```sql
SELECT DISTINCT customer_id FROM supermarket_transactions
```

## Average unit price per category

```sql
SELECT p.category, AVG(p.unit_price * c.quantity) AS avg_line
FROM cart c JOIN product p ON p.product_id = c.product_id
GROUP BY p.category
```

```sql
SELECT category, AVG(unit_price * quantity) AS avg_line
FROM supermarket_transactions
GROUP BY category
```

## Products by id, descending

```sql
SELECT product_id FROM product WHERE product_id <= 7 ORDER BY product_id DESC
```

```sql
SELECT DISTINCT product_id FROM supermarket_transactions ORDER BY product_id
```

## Cashier with no query pair

```sql
SELECT name FROM cashier
```

## Broken query

```sql
SELECT * FROM orders
```

```sql
SELECT * FROM supermarket_transactions
```

## Skipped entry

<!-- joinlab: skip -->

```sql
SELECT 1
```

```sql
SELECT 2
```
"#;

async fn fixture_db() -> DuckDbBackend {
    let db = DuckDbBackend::in_memory().unwrap();
    load_fixtures(&db, &FixtureSource::BuiltIn).await.unwrap();
    db
}

fn catalog() -> Catalog {
    let catalog = Catalog::parse(CATALOG);
    assert!(catalog.issues.is_empty(), "{:?}", catalog.issues);
    catalog
}

async fn run_one(id: &str) -> EntryResult {
    let db = fixture_db().await;
    let catalog = catalog();
    let runner = CatalogRunner::new(&db, RunOptions::default());
    runner.run_entry(catalog.get(id).unwrap()).await
}

#[tokio::test]
async fn test_equivalent_aggregate_passes() {
    let result = run_one("how-many-units-has-each-customer-bought").await;
    assert_eq!(result.status, EntryStatus::Passed, "{:?}", result);
    assert!(!result.ordered);
    assert_eq!(result.normalized_rows, Some(5));
    assert_eq!(result.denormalized_rows, Some(5));
}

#[tokio::test]
async fn test_customer_without_purchases_is_not_representable() {
    let result = run_one("which-customers-have-never-made-a-purchase").await;
    assert_eq!(result.status, EntryStatus::NotRepresentable);
    assert_eq!(result.normalized_rows, Some(1));
    assert_eq!(
        result.omitted_rows,
        vec![vec![Cell::Int(6), Cell::Text("Donald".to_string())]]
    );
    assert!(result.comparison.is_none());
}

#[tokio::test]
async fn test_not_representable_subset_lists_omitted_rows() {
    let result = run_one("which-customers-appear-in-the-data").await;
    assert_eq!(result.status, EntryStatus::NotRepresentable, "{:?}", result);
    assert_eq!(result.omitted_rows, vec![vec![Cell::Int(6)]]);
    assert_eq!(result.denormalized_rows, Some(5));
}

#[tokio::test]
async fn test_average_within_tolerance_passes() {
    let result = run_one("average-unit-price-per-category").await;
    assert_eq!(result.status, EntryStatus::Passed, "{:?}", result);
}

#[tokio::test]
async fn test_ordered_entries_compare_by_position() {
    let result = run_one("products-by-id-descending").await;
    assert!(result.ordered);
    assert_eq!(result.status, EntryStatus::Failed);
    let comparison = result.comparison.unwrap();
    assert!(!comparison.positional.is_empty());
    assert!(result.reason.unwrap().contains("differ by position"));
}

#[tokio::test]
async fn test_equivalent_without_denormalized_is_skipped() {
    let result = run_one("cashier-with-no-query-pair").await;
    assert_eq!(result.status, EntryStatus::Skipped);
    assert_eq!(result.reason.as_deref(), Some("no denormalized query"));
}

#[tokio::test]
async fn test_query_error_is_reported_not_fatal() {
    let result = run_one("broken-query").await;
    assert_eq!(result.status, EntryStatus::Error);
    assert_eq!(result.errors.len(), 1);
    assert!(result.is_failure());
}

#[tokio::test]
async fn test_skip_directive() {
    let result = run_one("skipped-entry").await;
    assert_eq!(result.status, EntryStatus::Skipped);
    assert_eq!(result.reason.as_deref(), Some("skipped by directive"));
}

#[tokio::test]
async fn test_run_all_summary() {
    let db = fixture_db().await;
    let catalog = catalog();
    let runner = CatalogRunner::new(&db, RunOptions::default());
    let entries = catalog.select(&[]).unwrap();
    let (results, summary) = runner.run_all(&entries).await;

    assert_eq!(results.len(), 8);
    assert_eq!(summary.total, 8);
    assert_eq!(summary.passed, 2);
    assert_eq!(summary.not_representable, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.not_run, 0);
    assert!(!summary.all_passed());
}

#[tokio::test]
async fn test_fail_fast_stops_at_first_failure() {
    let db = fixture_db().await;
    let catalog = catalog();
    let runner = CatalogRunner::new(
        &db,
        RunOptions {
            fail_fast: true,
            ..RunOptions::default()
        },
    );
    let entries = catalog.select(&[]).unwrap();
    let (results, summary) = runner.run_all(&entries).await;

    assert_eq!(results.len(), 5);
    assert_eq!(results[4].status, EntryStatus::Failed);
    assert_eq!(summary.not_run, 3);
}

#[test]
fn test_summary_all_passed() {
    let summary = RunSummary {
        total: 3,
        passed: 1,
        not_representable: 1,
        skipped: 1,
        ..RunSummary::default()
    };
    assert!(summary.all_passed());
}

#[tokio::test]
async fn test_not_representable_without_omitted_rows_is_flagged() {
    let db = fixture_db().await;
    let catalog = Catalog::parse(
        "## Cashiers who sold something\n\n<!-- joinlab: not-representable -->\n\n```sql\nSELECT DISTINCT cashier_id FROM cart\n```\n\n```sql\nSELECT DISTINCT cashier_id FROM supermarket_transactions\n```\n",
    );
    let runner = CatalogRunner::new(&db, RunOptions::default());
    let result = runner.run_entry(&catalog.entries[0]).await;

    assert_eq!(result.status, EntryStatus::NotRepresentable, "{:?}", result);
    assert!(result.omitted_rows.is_empty());
    assert_eq!(result.reason.as_deref(), Some(STALE_LABEL_NOTE));
}
