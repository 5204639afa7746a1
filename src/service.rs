//! Daily vibration queries over a sensor table.
//!
//! Ties the pipeline together: discover the table's columns, build the
//! statement for the requested date, run it through the executor and, for
//! outlier detection, analyse the rows in process.

use crate::analysis::{self, OutlierAnalysis};
use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::query::{build_daily_query, normalize_date, Identifier, QueryMode};
use crate::row::Value;
use crate::schema::{ColumnSchema, ResolvedSchema, ValueColumnPolicy};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// One reading: when it was taken and its absolute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub time: Value,
    pub value: Value,
}

/// Every reading of one day, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct DailyReadings {
    pub date: String,
    pub time_column: String,
    pub value_column: String,
    pub readings: Vec<Reading>,
}

impl fmt::Display for DailyReadings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.readings.is_empty() {
            return write!(f, "{}: no data.", self.date);
        }

        let lines = self
            .readings
            .iter()
            .map(|r| {
                format!(
                    "{}: {}, {}(abs): {}",
                    self.time_column, r.time, self.value_column, r.value
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        f.write_str(&lines)
    }
}

/// The strongest reading of one day, if the day has any.
#[derive(Debug, Clone, Serialize)]
pub struct PeakReading {
    pub date: String,
    pub time_column: String,
    pub value_column: String,
    pub peak: Option<Reading>,
}

impl fmt::Display for PeakReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.peak {
            Some(r) => write!(
                f,
                "On {}, max {}(abs) = {}, at {}: {}",
                self.date, self.value_column, r.value, self.time_column, r.time
            ),
            None => write!(f, "{}: no data.", self.date),
        }
    }
}

/// Outlier detection result for one day.
#[derive(Debug, Clone, Serialize)]
pub struct OutlierFindings {
    pub date: String,
    pub value_column: String,
    #[serde(flatten)]
    pub analysis: OutlierAnalysis,
}

impl fmt::Display for OutlierFindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.analysis {
            OutlierAnalysis::NoRowsForDate => write!(f, "{}: no data.", self.date),
            OutlierAnalysis::ZeroVariance { mean, sample_count } => write!(
                f,
                "{}: all {} readings equal {} (std=0), outliers cannot be determined.",
                self.date, sample_count, mean
            ),
            OutlierAnalysis::Report(report) if !report.has_outliers() => write!(
                f,
                "{}: no outliers found (mean={:.4}, std={:.4}, threshold={}).",
                self.date, report.mean, report.stddev, report.threshold
            ),
            OutlierAnalysis::Report(report) => {
                writeln!(
                    f,
                    "{}: {} outlier row(s) in {} (mean={:.4}, std={:.4}, threshold={}):",
                    self.date,
                    report.flagged_rows.len(),
                    self.value_column,
                    report.mean,
                    report.stddev,
                    report.threshold
                )?;
                let lines = report
                    .flagged_rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| format!("{}. {}", i + 1, row))
                    .collect::<Vec<_>>()
                    .join("\n");
                f.write_str(&lines)
            }
        }
    }
}

/// Vibration queries against one table.
pub struct VibrationService {
    executor: Arc<dyn QueryExecutor>,
    table: Identifier,
    policy: ValueColumnPolicy,
}

impl VibrationService {
    /// Create a service for `table`. The table name is validated up front.
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        table: &str,
        policy: ValueColumnPolicy,
    ) -> Result<Self> {
        Ok(Self {
            executor,
            table: Identifier::new(table)?,
            policy,
        })
    }

    pub fn table(&self) -> &Identifier {
        &self.table
    }

    /// Columns of the table, classified but not yet resolved.
    pub async fn detect_columns(&self) -> Result<ColumnSchema> {
        let columns = self.executor.list_columns(self.table.as_str()).await?;
        Ok(ColumnSchema::detect(&columns))
    }

    /// Discover the value and time columns using the configured policy.
    pub async fn resolve_schema(&self) -> Result<ResolvedSchema> {
        let schema = self.detect_columns().await?.resolve(&self.policy)?;
        debug!(
            "Resolved {}: value={}, time={}",
            self.table,
            schema.value_column(),
            schema.time_column()
        );
        Ok(schema)
    }

    /// All readings for a date, ordered by time.
    #[instrument(skip(self))]
    pub async fn get_all(&self, date: &str) -> Result<DailyReadings> {
        let date = normalize_date(date)?;
        info!("Getting all vibration data for {}", date);

        let schema = self.resolve_schema().await?;
        let stmt = build_daily_query(&self.table, &schema, &date, QueryMode::AllRows)?;
        let rows = self.executor.execute(&stmt).await?;

        Ok(DailyReadings {
            date,
            time_column: schema.time_column().to_string(),
            value_column: schema.value_column().to_string(),
            readings: rows.iter().map(to_reading).collect(),
        })
    }

    /// The reading with the largest absolute value for a date.
    #[instrument(skip(self))]
    pub async fn get_max(&self, date: &str) -> Result<PeakReading> {
        let date = normalize_date(date)?;
        info!("Getting max vibration for {}", date);

        let schema = self.resolve_schema().await?;
        let stmt = build_daily_query(&self.table, &schema, &date, QueryMode::MaxRow)?;
        let rows = self.executor.execute(&stmt).await?;

        Ok(PeakReading {
            date,
            time_column: schema.time_column().to_string(),
            value_column: schema.value_column().to_string(),
            peak: rows.first().map(to_reading),
        })
    }

    /// Flag readings more than `threshold` standard deviations from the day's mean.
    #[instrument(skip(self))]
    pub async fn find_outliers(&self, date: &str, threshold: f64) -> Result<OutlierFindings> {
        let date = normalize_date(date)?;
        info!("Finding vibration outliers for {} (threshold {})", date, threshold);

        let schema = self.resolve_schema().await?;
        let stmt = build_daily_query(&self.table, &schema, &date, QueryMode::FullRow)?;
        let rows = self.executor.execute(&stmt).await?;

        let analysis = analysis::find_outliers(&rows, schema.value_column(), threshold)?;

        Ok(OutlierFindings {
            date,
            value_column: schema.value_column().to_string(),
            analysis,
        })
    }
}

fn to_reading(row: &crate::row::Row) -> Reading {
    Reading {
        time: row.at(0).cloned().unwrap_or(Value::Null),
        value: row.at(1).cloned().unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalysisError, QueryError, SchemaError, VibraError};
    use crate::executor::SqliteExecutor;
    use rusqlite::Connection;

    fn service_with(ddl: &str, policy: ValueColumnPolicy) -> VibrationService {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(ddl).unwrap();
        let executor = Arc::new(SqliteExecutor::from_connection(conn));
        VibrationService::new(executor, "machine_log", policy).unwrap()
    }

    fn service() -> VibrationService {
        service_with(
            r#"
            CREATE TABLE machine_log (
                id INTEGER PRIMARY KEY,
                log_time TEXT NOT NULL,
                Vibration_RMS REAL,
                operator TEXT
            );
            INSERT INTO machine_log (log_time, Vibration_RMS, operator) VALUES
                ('2025-07-27 10:00:00', 3, 'amy'),
                ('2025-07-27 08:00:00', -2, 'bo'),
                ('2025-07-27 09:00:00', 100, 'amy'),
                ('2025-07-28 08:00:00', 4, 'bo'),
                ('2025-07-28 09:00:00', 4, 'bo'),
                ('2025-07-29 08:00:00', NULL, 'cy');
            "#,
            ValueColumnPolicy::First,
        )
    }

    #[tokio::test]
    async fn test_get_all_orders_by_time_with_abs_values() {
        let readings = service().get_all("2025-07-27").await.unwrap();
        assert_eq!(readings.time_column, "log_time");
        assert_eq!(readings.value_column, "Vibration_RMS");

        let values: Vec<_> = readings.readings.iter().map(|r| r.value.as_f64()).collect();
        assert_eq!(values, vec![Some(2.0), Some(100.0), Some(3.0)]);
        assert_eq!(
            readings.to_string().lines().next(),
            Some("log_time: 2025-07-27 08:00:00, Vibration_RMS(abs): 2")
        );
    }

    #[tokio::test]
    async fn test_get_all_empty_day() {
        let readings = service().get_all("2024-01-01").await.unwrap();
        assert!(readings.readings.is_empty());
        assert_eq!(readings.to_string(), "2024-01-01: no data.");
    }

    #[tokio::test]
    async fn test_get_max_uses_absolute_value() {
        let svc = service_with(
            r#"
            CREATE TABLE machine_log (ts_time TEXT, vibration REAL);
            INSERT INTO machine_log VALUES
                ('2025-07-27 08:00:00', 5.5),
                ('2025-07-27 09:00:00', -9.25),
                ('2025-07-27 10:00:00', 7.0);
            "#,
            ValueColumnPolicy::First,
        );
        let peak = svc.get_max("2025-07-27").await.unwrap();
        let reading = peak.peak.clone().unwrap();
        assert_eq!(reading.value, Value::Real(9.25));
        assert_eq!(reading.time, Value::Text("2025-07-27 09:00:00".into()));
        assert_eq!(
            peak.to_string(),
            "On 2025-07-27, max vibration(abs) = 9.25, at ts_time: 2025-07-27 09:00:00"
        );

        assert!(svc.get_max("2025-07-30").await.unwrap().peak.is_none());
    }

    #[tokio::test]
    async fn test_find_outliers_end_to_end() {
        let findings = service().find_outliers("2025-07-27", 1.0).await.unwrap();
        let OutlierAnalysis::Report(report) = &findings.analysis else {
            panic!("Expected a report");
        };
        assert!((report.mean - 35.0).abs() < 1e-9);
        assert_eq!(report.flagged_rows.len(), 1);
        assert_eq!(report.flagged_rows[0].get("operator"), Some(&Value::from("amy")));
        assert_eq!(report.flagged_rows[0].len(), 4);
        assert!(findings.to_string().contains("1. id: 3, log_time: 2025-07-27 09:00:00"));
    }

    #[tokio::test]
    async fn test_find_outliers_outcomes() {
        let svc = service();

        let findings = svc.find_outliers("2025-07-28", 3.0).await.unwrap();
        assert!(matches!(findings.analysis, OutlierAnalysis::ZeroVariance { .. }));

        let findings = svc.find_outliers("2025-08-01", 3.0).await.unwrap();
        assert_eq!(findings.analysis, OutlierAnalysis::NoRowsForDate);

        let err = svc.find_outliers("2025-07-29", 3.0).await.unwrap_err();
        assert!(matches!(err, VibraError::Analysis(AnalysisError::NoNumericData)));
    }

    #[tokio::test]
    async fn test_incompatible_tables() {
        let svc = service_with(
            "CREATE TABLE machine_log (log_time TEXT, temperature REAL);",
            ValueColumnPolicy::First,
        );
        let err = svc.get_all("2025-07-27").await.unwrap_err();
        assert!(matches!(err, VibraError::Schema(SchemaError::NoValueColumn)));

        let svc = service_with(
            "CREATE TABLE machine_log (id INTEGER, vibration REAL);",
            ValueColumnPolicy::First,
        );
        let err = svc.get_max("2025-07-27").await.unwrap_err();
        assert!(matches!(err, VibraError::Schema(SchemaError::NoTimeColumn)));
    }

    #[tokio::test]
    async fn test_ambiguity_policy_is_applied() {
        let ddl = "CREATE TABLE machine_log (t_time TEXT, vibration_x REAL, vibration_y REAL);";
        let svc = service_with(ddl, ValueColumnPolicy::ErrorOnAmbiguity);
        let err = svc.resolve_schema().await.unwrap_err();
        assert!(matches!(err, VibraError::Schema(SchemaError::AmbiguousValueColumn(_))));

        let svc = service_with(ddl, ValueColumnPolicy::Column("vibration_y".into()));
        assert_eq!(svc.resolve_schema().await.unwrap().value_column(), "vibration_y");
    }

    #[tokio::test]
    async fn test_unsafe_column_names_are_rejected() {
        let svc = service_with(
            r#"CREATE TABLE machine_log ("time;x" TEXT, "vibration--" REAL);"#,
            ValueColumnPolicy::First,
        );
        let err = svc.get_all("2025-07-27").await.unwrap_err();
        assert!(matches!(err, VibraError::Query(QueryError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn test_bad_table_and_date_rejected() {
        let executor = Arc::new(SqliteExecutor::in_memory().unwrap());
        assert!(matches!(
            VibrationService::new(executor, "log; DROP TABLE x", ValueColumnPolicy::First),
            Err(VibraError::Query(QueryError::InvalidIdentifier(_)))
        ));

        let err = service().get_all("yesterday").await.unwrap_err();
        assert!(matches!(err, VibraError::Query(QueryError::InvalidDate(_))));
    }
}
