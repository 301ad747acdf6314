//! SQL identifier quoting utilities
//!
//! Generated DDL and fixture checks interpolate relation and column names,
//! so every identifier goes through these helpers.

/// Quote a SQL identifier.
///
/// Wraps the identifier in double quotes and doubles embedded double quotes.
///
/// # Examples
/// ```
/// use jl_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("cart"), r#""cart""#);
/// assert_eq!(quote_ident(r#"odd"name"#), r#""odd""name""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Split a potentially schema-qualified relation name into (schema, relation).
///
/// Uses the last `.` as the separator and defaults the schema to `main`.
///
/// # Examples
/// ```
/// use jl_core::sql_utils::split_qualified_name;
/// assert_eq!(split_qualified_name("cart"), ("main", "cart"));
/// assert_eq!(split_qualified_name("fixtures.cart"), ("fixtures", "cart"));
/// ```
pub fn split_qualified_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("main", name),
    }
}

/// Escape a value for use inside a single-quoted SQL string literal.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}
