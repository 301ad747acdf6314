use super::*;
use crate::parser::SqlParser;

fn shape(sql: &str) -> QueryShape {
    SqlParser::duckdb().parse_query(sql).unwrap()
}

#[test]
fn test_extract_from_join() {
    let s = shape("SELECT * FROM cart c JOIN customer cu ON c.customer_id = cu.customer_id");
    assert_eq!(s.relations, vec!["cart", "customer"]);
    assert!(!s.reads("supermarket_transactions"));
}

#[test]
fn test_quoted_and_mixed_case_names_are_normalized() {
    let s = shape(r#"SELECT * FROM "Cart" JOIN PRODUCT USING (product_id)"#);
    assert_eq!(s.relations, vec!["cart", "product"]);
}

#[test]
fn test_subquery_relations_are_included() {
    let s = shape(
        "SELECT customer_id FROM customer \
         WHERE customer_id NOT IN (SELECT customer_id FROM cart)",
    );
    assert!(s.reads("customer"));
    assert!(s.reads("cart"));
}

#[test]
fn test_cte_names_are_excluded() {
    let s = shape(
        "WITH spend AS (SELECT customer_id, SUM(quantity) AS q FROM cart GROUP BY customer_id) \
         SELECT * FROM spend JOIN customer USING (customer_id)",
    );
    assert_eq!(s.relations, vec!["cart", "customer"]);
}

#[test]
fn test_top_level_order_by() {
    assert!(shape("SELECT * FROM cashier ORDER BY name").ordered);
    assert!(!shape("SELECT * FROM cashier").ordered);
}

#[test]
fn test_order_by_in_subquery_is_not_top_level() {
    let s = shape("SELECT * FROM (SELECT * FROM product ORDER BY unit_price LIMIT 3) AS top3");
    assert!(!s.ordered);
    assert!(s.reads("product"));
}
