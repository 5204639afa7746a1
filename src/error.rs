//! Error types for Vibra.

use thiserror::Error;

/// Library-level error type for Vibra operations.
#[derive(Error, Debug)]
pub enum VibraError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Incompatible table: {0}")]
    Schema(#[from] SchemaError),

    #[error("Rejected query: {0}")]
    Query(#[from] QueryError),

    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

impl From<rusqlite::Error> for VibraError {
    fn from(e: rusqlite::Error) -> Self {
        VibraError::Execution(e.to_string())
    }
}

/// Why a table's columns could not be mapped onto a value/time schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("no vibration column found")]
    NoValueColumn,

    #[error("no time/date column found for filtering")]
    NoTimeColumn,

    #[error("several vibration columns match ({}); pick one explicitly", .0.join(", "))]
    AmbiguousValueColumn(Vec<String>),

    #[error("column '{0}' does not exist in the table")]
    UnknownColumn(String),
}

/// Statement construction refused before any SQL text was produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("identifier '{0}' may only contain letters, digits and underscores")]
    InvalidIdentifier(String),

    #[error("'{0}' is not a date in YYYY-MM-DD form")]
    InvalidDate(String),
}

/// Statistics could not be computed from the supplied values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("no valid numeric vibration data")]
    NoNumericData,

    #[error("input list is empty or has no numeric values")]
    EmptyOrInvalidInput,

    #[error("threshold must be a finite number >= 0, got {0}")]
    InvalidThreshold(f64),
}

/// Result type alias for Vibra operations.
pub type Result<T> = std::result::Result<T, VibraError>;
