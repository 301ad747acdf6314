use super::*;
use crate::parser::SqlParser;

fn validate(sql: &str) -> SqlResult<()> {
    let statements = SqlParser::duckdb().parse(sql)?;
    validate_single_query(&statements).map(|_| ())
}

#[test]
fn test_select_is_accepted() {
    assert!(validate("SELECT * FROM supermarket_transactions").is_ok());
}

#[test]
fn test_cte_query_is_accepted() {
    assert!(validate("WITH t AS (SELECT 1 AS x) SELECT x FROM t").is_ok());
}

#[test]
fn test_union_is_accepted() {
    assert!(validate("SELECT customer_id FROM customer UNION SELECT customer_id FROM cart").is_ok());
}

#[test]
fn test_insert_is_rejected() {
    let err = validate("INSERT INTO cashier VALUES (9, 'Mallory')").unwrap_err();
    match err {
        SqlError::UnsupportedStatement(msg) => assert!(msg.starts_with("INSERT")),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_drop_is_rejected() {
    assert!(matches!(
        validate("DROP TABLE cart"),
        Err(SqlError::UnsupportedStatement(_))
    ));
}

#[test]
fn test_multiple_statements_rejected() {
    assert!(matches!(
        validate("SELECT 1; SELECT 2; SELECT 3"),
        Err(SqlError::MultipleStatements(3))
    ));
}

#[test]
fn test_empty_statement_list() {
    assert!(matches!(validate_single_query(&[]), Err(SqlError::EmptySql)));
}

#[test]
fn test_error_codes() {
    assert_eq!(validate("DROP TABLE cart").unwrap_err().code(), "S003");
    assert_eq!(validate("SELECT 1; SELECT 2").unwrap_err().code(), "S004");
    assert_eq!(validate("SELECT * FROM cart WHERE ,").unwrap_err().code(), "S001");
}
