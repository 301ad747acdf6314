//! Catalog query validation

use crate::error::{SqlError, SqlResult};
use sqlparser::ast::{Query, Statement};

/// Require exactly one statement and that it is a read-only query.
///
/// Catalog examples are pure reads; anything that writes, creates or drops
/// is rejected before it reaches the database.
pub fn validate_single_query(statements: &[Statement]) -> SqlResult<&Query> {
    match statements {
        [] => Err(SqlError::EmptySql),
        [Statement::Query(query)] => Ok(query),
        [other] => Err(SqlError::UnsupportedStatement(format!(
            "{} statements are not allowed in catalog queries",
            statement_keyword(other)
        ))),
        many => Err(SqlError::MultipleStatements(many.len())),
    }
}

/// Leading keyword of a statement, used in error messages
fn statement_keyword(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or("UNKNOWN")
        .to_uppercase()
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
