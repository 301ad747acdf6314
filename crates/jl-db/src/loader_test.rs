use super::*;
use crate::duckdb::DuckDbBackend;
use crate::result::Cell;

const CUSTOMER_CSV: &str = "customer_id,first_name,last_name,phone_number,date_of_birth
1,Ada,Lovelace,555-0101,1985-12-10
2,Grace,Hopper,555-0102,1976-12-09
";

const CASHIER_CSV: &str = "cashier_id,name
1,Maria Santos
";

const PRODUCT_CSV: &str = "product_id,description,brand_name,category,unit_price
1,Whole milk 1L,Dairyland,Dairy,1.29
2,Sourdough loaf,Bakehouse,Bakery,3.50
";

const CART_CSV: &str = "purchase_id,transaction_id,customer_id,cashier_id,product_id,quantity,purchase_date,purchase_time,payment_method,store_location,discount_percent,is_discounted
1,101,1,1,1,2,2024-03-01,09:15:00,card,Downtown,0.00,false
2,101,1,1,2,1,2024-03-01,09:15:00,card,Downtown,0.00,false
";

fn write_fixture_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

#[tokio::test]
async fn test_builtin_load_counts() {
    let db = DuckDbBackend::in_memory().unwrap();
    let stats = load_fixtures(&db, &FixtureSource::BuiltIn).await.unwrap();

    assert_eq!(stats.rows("customer"), Some(6));
    assert_eq!(stats.rows("cashier"), Some(3));
    assert_eq!(stats.rows("product"), Some(8));
    assert_eq!(stats.rows("cart"), Some(16));
    assert_eq!(stats.rows("supermarket_transactions"), Some(16));

    let denormalized = stats
        .relations
        .iter()
        .find(|r| r.kind == RelationKind::Denormalized)
        .unwrap();
    assert_eq!(denormalized.origin, RowOrigin::Flattened);
}

#[tokio::test]
async fn test_builtin_rows_include_customers_without_purchases() {
    let db = DuckDbBackend::in_memory().unwrap();
    load_fixtures(&db, &FixtureSource::BuiltIn).await.unwrap();

    let rs = db
        .query_rows(
            "SELECT cu.customer_id FROM customer cu \
             LEFT JOIN cart c ON c.customer_id = cu.customer_id \
             WHERE c.purchase_id IS NULL",
        )
        .await
        .unwrap();
    assert_eq!(rs.rows, vec![vec![Cell::Int(6)]]);
}

#[tokio::test]
async fn test_reload_is_idempotent() {
    let db = DuckDbBackend::in_memory().unwrap();
    let first = load_fixtures(&db, &FixtureSource::BuiltIn).await.unwrap();
    let second = load_fixtures(&db, &FixtureSource::BuiltIn).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_flattened_rows_carry_cashier_name() {
    let db = DuckDbBackend::in_memory().unwrap();
    load_fixtures(&db, &FixtureSource::BuiltIn).await.unwrap();

    let rs = db
        .query_rows("SELECT cashier_name FROM supermarket_transactions WHERE purchase_id = 4")
        .await
        .unwrap();
    assert_eq!(rs.rows, vec![vec![Cell::Text("Tom Becker".to_string())]]);
}

#[tokio::test]
async fn test_directory_load() {
    let dir = write_fixture_dir(&[
        ("customer.csv", CUSTOMER_CSV),
        ("cashier.csv", CASHIER_CSV),
        ("product.csv", PRODUCT_CSV),
        ("cart.csv", CART_CSV),
    ]);
    let db = DuckDbBackend::in_memory().unwrap();
    let stats = load_fixtures(&db, &FixtureSource::Directory(dir.path().to_path_buf()))
        .await
        .unwrap();

    assert_eq!(stats.rows("customer"), Some(2));
    assert_eq!(stats.rows("cart"), Some(2));
    assert_eq!(stats.rows("supermarket_transactions"), Some(2));
    assert!(stats.relations.iter().take(4).all(|r| r.origin == RowOrigin::Csv));
    assert_eq!(stats.total_rows(), 2 + 1 + 2 + 2 + 2);
}

#[tokio::test]
async fn test_missing_csv_leaves_relation_empty() {
    let dir = write_fixture_dir(&[("customer.csv", CUSTOMER_CSV)]);
    let db = DuckDbBackend::in_memory().unwrap();
    let stats = load_fixtures(&db, &FixtureSource::Directory(dir.path().to_path_buf()))
        .await
        .unwrap();

    assert_eq!(stats.rows("customer"), Some(2));
    assert_eq!(stats.rows("cart"), Some(0));
    let cart = stats.relations.iter().find(|r| r.name == "cart").unwrap();
    assert_eq!(cart.origin, RowOrigin::Missing);
    assert!(db.relation_exists("cart").await.unwrap());
}

#[tokio::test]
async fn test_denormalized_csv_is_loaded_as_is() {
    let denormalized = "purchase_id,transaction_id,customer_id,first_name,quantity
1,101,1,Ada,0
";
    let dir = write_fixture_dir(&[("supermarket_transactions.csv", denormalized)]);
    let db = DuckDbBackend::in_memory().unwrap();
    let stats = load_fixtures(&db, &FixtureSource::Directory(dir.path().to_path_buf()))
        .await
        .unwrap();

    // no CHECK on the flattened table, so the zero quantity loads
    assert_eq!(stats.rows("supermarket_transactions"), Some(1));
}

#[tokio::test]
async fn test_constraint_violation_is_fatal() {
    // cart line references customer 9 which does not exist
    let cart = "purchase_id,transaction_id,customer_id,cashier_id,product_id,quantity
1,101,9,1,1,2
";
    let dir = write_fixture_dir(&[
        ("customer.csv", CUSTOMER_CSV),
        ("cashier.csv", CASHIER_CSV),
        ("product.csv", PRODUCT_CSV),
        ("cart.csv", cart),
    ]);
    let db = DuckDbBackend::in_memory().unwrap();
    let err = load_fixtures(&db, &FixtureSource::Directory(dir.path().to_path_buf()))
        .await
        .unwrap_err();
    match err {
        DbError::FixtureError { relation, .. } => assert_eq!(relation, "cart"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_source_from_option() {
    assert_eq!(FixtureSource::from_option(None), FixtureSource::BuiltIn);
    assert_eq!(
        FixtureSource::from_option(Some(PathBuf::from("fixtures"))),
        FixtureSource::Directory(PathBuf::from("fixtures"))
    );
}
