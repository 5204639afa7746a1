//! Query execution abstraction.
//!
//! The analysis pipeline only needs two capabilities from a database: list a
//! table's columns and run a prepared statement. Backends implement
//! [`QueryExecutor`]; each call acquires and releases its own resources.

mod sqlite;

pub use sqlite::SqliteExecutor;

use crate::error::Result;
use crate::query::Statement;
use crate::row::Row;
use async_trait::async_trait;

/// Trait for tabular query backends.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Column names of `table`, in declared order.
    async fn list_columns(&self, table: &str) -> Result<Vec<String>>;

    /// Run a statement, binding its parameters in order.
    async fn execute(&self, statement: &Statement) -> Result<Vec<Row>>;
}
