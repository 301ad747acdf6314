//! Database trait definition

use crate::error::DbResult;
use crate::result::ResultSet;
use async_trait::async_trait;

/// Database abstraction trait for Joinlab
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute a query and return every row as typed cells
    async fn query_rows(&self, sql: &str) -> DbResult<ResultSet>;

    /// Execute query returning row count
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Query and return sample rows as formatted strings
    /// Returns up to `limit` rows, each as a comma-separated string
    async fn query_sample_rows(&self, sql: &str, limit: usize) -> DbResult<Vec<String>>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Append the rows of a headered CSV file to an existing table,
    /// matching CSV columns to table columns by name.
    /// Returns the number of rows inserted.
    async fn load_csv(&self, table: &str, path: &str) -> DbResult<usize>;

    /// Drop a table if it exists
    async fn drop_if_exists(&self, name: &str) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
