//! SQLite-backed query executor.

use super::QueryExecutor;
use crate::error::{Result, VibraError};
use crate::query::{describe_columns, Statement};
use crate::row::{Row, Value};
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

/// Executor over a single SQLite connection.
pub struct SqliteExecutor {
    conn: Mutex<Connection>,
}

impl SqliteExecutor {
    /// Open (or create) a database file.
    #[instrument(skip_all)]
    pub fn open(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        info!("Opened SQLite database at {:?}", path);

        Ok(Self::from_connection(conn))
    }

    /// Create an empty in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Wrap an already configured connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VibraError::Execution(format!("Failed to acquire lock: {}", e)))
    }

    fn run(conn: &Connection, statement: &Statement) -> Result<Vec<Row>> {
        let mut stmt = conn.prepare(&statement.sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt.query_map(params_from_iter(statement.params.iter()), |row| {
            let mut out = Row::new();
            for (i, name) in columns.iter().enumerate() {
                out.push(name, to_value(row.get_ref(i)?));
            }
            Ok(out)
        })?;

        let rows = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Text(format!("<blob {} bytes>", bytes.len())),
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    #[instrument(skip(self))]
    async fn list_columns(&self, table: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let rows = Self::run(&conn, &describe_columns(table))?;
        let columns: Vec<String> = rows
            .iter()
            .filter_map(|row| match row.at(0) {
                Some(Value::Text(name)) => Some(name.clone()),
                _ => None,
            })
            .collect();

        if columns.is_empty() {
            return Err(VibraError::Execution(format!("Table not found: {}", table)));
        }

        debug!("Table {} has columns {:?}", table, columns);
        Ok(columns)
    }

    #[instrument(skip(self, statement), fields(sql = %statement.sql))]
    async fn execute(&self, statement: &Statement) -> Result<Vec<Row>> {
        let conn = self.lock()?;

        let rows = Self::run(&conn, statement)?;
        debug!("Statement returned {} rows", rows.len());
        Ok(rows)
    }
}
