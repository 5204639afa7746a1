//! SQL statement construction for daily vibration queries.
//!
//! Table and column names cannot be bound as parameters, so they are checked
//! against a strict allow-list before they are spliced into statement text.
//! The date is always bound.

use crate::error::QueryError;
use crate::schema::ResolvedSchema;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Alias given to `ABS(value_column)` in projected queries.
pub const ABS_ALIAS: &str = "vib_abs";

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("Invalid regex"))
}

/// A table or column name that is safe to interpolate into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Validate a raw name.
    pub fn new(name: &str) -> Result<Self, QueryError> {
        if identifier_regex().is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(QueryError::InvalidIdentifier(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted form, accepted by both SQLite and MySQL.
    fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which of the daily query shapes to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Time and absolute value of every reading, oldest first.
    AllRows,
    /// The single reading with the largest absolute value.
    MaxRow,
    /// Every column of every reading, for in-process analysis.
    FullRow,
}

/// Statement text plus the values to bind to its `?` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

/// Parse a calendar date and return it in canonical `YYYY-MM-DD` form.
pub fn normalize_date(date: &str) -> Result<String, QueryError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| QueryError::InvalidDate(date.to_string()))
}

/// Build one of the daily statements for `table`.
pub fn build_daily_query(
    table: &Identifier,
    schema: &ResolvedSchema,
    date: &str,
    mode: QueryMode,
) -> Result<Statement, QueryError> {
    let time_col = Identifier::new(schema.time_column())?.quoted();
    let value_col = Identifier::new(schema.value_column())?.quoted();
    let date = normalize_date(date)?;
    let table = table.quoted();

    let sql = match mode {
        QueryMode::AllRows => format!(
            "SELECT {time_col}, ABS({value_col}) AS {ABS_ALIAS} FROM {table} \
             WHERE DATE({time_col}) = ? ORDER BY {time_col} ASC"
        ),
        QueryMode::MaxRow => format!(
            "SELECT {time_col}, ABS({value_col}) AS {ABS_ALIAS} FROM {table} \
             WHERE DATE({time_col}) = ? ORDER BY {ABS_ALIAS} DESC LIMIT 1"
        ),
        QueryMode::FullRow => format!(
            "SELECT * FROM {table} WHERE DATE({time_col}) = ? ORDER BY {time_col} ASC"
        ),
    };

    Ok(Statement {
        sql,
        params: vec![date],
    })
}

/// Statement listing a table's column names in declared order (SQLite).
///
/// The table name is bound, so it needs no validation here.
pub fn describe_columns(table: &str) -> Statement {
    Statement {
        sql: "SELECT name FROM pragma_table_info(?) ORDER BY cid".to_string(),
        params: vec![table.to_string()],
    }
}
