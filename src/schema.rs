//! Column discovery for sensor tables.
//!
//! Tables are not described up front. The value column is whichever column
//! mentions "vibration" and the time columns are those mentioning "time" or
//! "date", all matched case-insensitively against the declared column names.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};

const VALUE_MARKER: &str = "vibration";
const TIME_MARKERS: [&str; 2] = ["time", "date"];

/// How to pick the value column when several columns match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueColumnPolicy {
    /// Take the first matching column in declared order.
    #[default]
    First,
    /// Refuse to guess when more than one column matches.
    ErrorOnAmbiguity,
    /// Use this column regardless of its name.
    Column(String),
}

/// Every candidate column found in a table, before any policy is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    /// Declared column names, in table order.
    pub columns: Vec<String>,
    /// Columns whose name contains "vibration", in table order.
    pub value_candidates: Vec<String>,
    /// Columns whose name contains "time" or "date", in table order.
    pub time_columns: Vec<String>,
}

impl ColumnSchema {
    /// Classify a table's columns.
    pub fn detect<S: AsRef<str>>(columns: &[S]) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();

        let value_candidates = columns
            .iter()
            .filter(|c| c.to_lowercase().contains(VALUE_MARKER))
            .cloned()
            .collect();

        let time_columns = columns
            .iter()
            .filter(|c| {
                let lower = c.to_lowercase();
                TIME_MARKERS.iter().any(|m| lower.contains(m))
            })
            .cloned()
            .collect();

        Self {
            columns,
            value_candidates,
            time_columns,
        }
    }

    /// First value candidate, if any.
    pub fn value_column(&self) -> Option<&str> {
        self.value_candidates.first().map(String::as_str)
    }

    /// Apply a disambiguation policy and settle on one value and one time column.
    pub fn resolve(&self, policy: &ValueColumnPolicy) -> Result<ResolvedSchema, SchemaError> {
        let value_column = match policy {
            ValueColumnPolicy::First => self
                .value_column()
                .ok_or(SchemaError::NoValueColumn)?
                .to_string(),
            ValueColumnPolicy::ErrorOnAmbiguity => match self.value_candidates.as_slice() {
                [] => return Err(SchemaError::NoValueColumn),
                [only] => only.clone(),
                many => return Err(SchemaError::AmbiguousValueColumn(many.to_vec())),
            },
            ValueColumnPolicy::Column(name) => self
                .columns
                .iter()
                .find(|c| c.eq_ignore_ascii_case(name))
                .cloned()
                .ok_or_else(|| SchemaError::UnknownColumn(name.clone()))?,
        };

        ResolvedSchema::new(value_column, self.time_columns.clone())
    }
}

/// A table schema with exactly one value column and at least one time column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSchema {
    value_column: String,
    time_column: String,
    time_columns: Vec<String>,
}

impl ResolvedSchema {
    /// Build a schema, refusing an empty value column or an empty time column list.
    pub fn new(
        value_column: impl Into<String>,
        time_columns: Vec<String>,
    ) -> Result<Self, SchemaError> {
        let value_column = value_column.into();
        if value_column.is_empty() {
            return Err(SchemaError::NoValueColumn);
        }
        let time_column = time_columns.first().cloned().ok_or(SchemaError::NoTimeColumn)?;

        Ok(Self {
            value_column,
            time_column,
            time_columns,
        })
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    /// The column used to filter and order by date.
    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    /// Every time/date column, primary first.
    pub fn time_columns(&self) -> &[String] {
        &self.time_columns
    }
}

/// Resolve a column list with the given policy in one step.
pub fn resolve_columns<S: AsRef<str>>(
    columns: &[S],
    policy: &ValueColumnPolicy,
) -> Result<ResolvedSchema, SchemaError> {
    ColumnSchema::detect(columns).resolve(policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_value_and_time_columns() {
        let schema = ColumnSchema::detect(&["id", "Timestamp", "Vibration_X", "created_date", "temp"]);
        assert_eq!(schema.value_column(), Some("Vibration_X"));
        assert_eq!(schema.time_columns, vec!["Timestamp", "created_date"]);
    }

    #[test]
    fn test_resolved_schema_requires_time_column() {
        assert_eq!(
            ResolvedSchema::new("vibration", vec![]).unwrap_err(),
            SchemaError::NoTimeColumn
        );
        assert_eq!(
            ResolvedSchema::new("", vec!["rec_time".to_string()]).unwrap_err(),
            SchemaError::NoValueColumn
        );

        let schema = ResolvedSchema::new("vibration", vec!["rec_time".into(), "rec_date".into()]).unwrap();
        assert_eq!(schema.time_column(), "rec_time");
        assert_eq!(schema.time_columns().len(), 2);
    }

    #[test]
    fn test_no_value_column() {
        let err = resolve_columns(&["id", "ts_time", "temperature"], &ValueColumnPolicy::First).unwrap_err();
        assert_eq!(err, SchemaError::NoValueColumn);
    }

    #[test]
    fn test_no_time_column() {
        let err = resolve_columns(&["id", "vibration"], &ValueColumnPolicy::First).unwrap_err();
        assert_eq!(err, SchemaError::NoTimeColumn);
    }

    #[test]
    fn test_value_column_checked_before_time_column() {
        let err = resolve_columns(&["id", "speed"], &ValueColumnPolicy::First).unwrap_err();
        assert_eq!(err, SchemaError::NoValueColumn);
    }

    #[test]
    fn test_primary_time_column_is_first_declared() {
        let columns = ["update_date", "id", "vibration", "event_time", "datetime_utc"];
        let resolved = resolve_columns(&columns, &ValueColumnPolicy::First).unwrap();
        assert_eq!(resolved.time_column(), "update_date");
        assert_eq!(resolved.time_columns, vec!["update_date", "event_time", "datetime_utc"]);
    }

    #[test]
    fn test_first_policy_picks_first_candidate() {
        let columns = ["time", "vibration_y", "vibration_x"];
        let resolved = resolve_columns(&columns, &ValueColumnPolicy::First).unwrap();
        assert_eq!(resolved.value_column(), "vibration_y");
    }

    #[test]
    fn test_error_policy_rejects_ambiguity() {
        let columns = ["time", "vibration_y", "vibration_x"];
        let err = resolve_columns(&columns, &ValueColumnPolicy::ErrorOnAmbiguity).unwrap_err();
        assert_eq!(
            err,
            SchemaError::AmbiguousValueColumn(vec!["vibration_y".into(), "vibration_x".into()])
        );

        let resolved =
            resolve_columns(&["time", "vibration"], &ValueColumnPolicy::ErrorOnAmbiguity).unwrap();
        assert_eq!(resolved.value_column(), "vibration");
    }

    #[test]
    fn test_explicit_column_override() {
        let columns = ["time", "vibration_y", "accel_z"];
        let resolved =
            resolve_columns(&columns, &ValueColumnPolicy::Column("ACCEL_Z".into())).unwrap();
        assert_eq!(resolved.value_column(), "accel_z");

        let err = resolve_columns(&columns, &ValueColumnPolicy::Column("missing".into())).unwrap_err();
        assert_eq!(err, SchemaError::UnknownColumn("missing".into()));
    }
}
