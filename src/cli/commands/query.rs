//! Direct vibration queries: columns, all, max, outliers, analyze.

use super::open_service;
use crate::analysis::{analyze_vibration_list, OutlierAnalysis};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::row::Value;
use anyhow::Result;
use serde::Serialize;

fn preflight(settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Query, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vibra doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Show the table's columns and how they were classified.
pub async fn run_columns(settings: &Settings) -> Result<()> {
    preflight(settings)?;
    let service = open_service(settings)?;
    let detected = service.detect_columns().await?;

    Output::header(&format!("Table {}", service.table()));
    for column in &detected.columns {
        let role = if detected.value_candidates.contains(column) {
            " (vibration)"
        } else if detected.time_columns.contains(column) {
            " (time)"
        } else {
            ""
        };
        Output::list_item(&format!("{}{}", column, role));
    }
    println!();

    match detected.resolve(&settings.value_column_policy()) {
        Ok(schema) => {
            Output::kv("Value column", schema.value_column());
            Output::kv("Time column", schema.time_column());
            if detected.value_candidates.len() > 1 && settings.database.value_column.is_none() {
                Output::kv("On ambiguity", &settings.database.on_ambiguity.to_string());
            }
        }
        Err(e) => Output::warning(&e.to_string()),
    }

    Ok(())
}

/// Print every reading on a date.
pub async fn run_all(date: &str, json: bool, settings: &Settings) -> Result<()> {
    preflight(settings)?;
    let daily = open_service(settings)?.get_all(date).await?;

    if json {
        return print_json(&daily);
    }

    if daily.readings.is_empty() {
        Output::info(&daily.to_string());
        return Ok(());
    }

    Output::header(&format!(
        "{} on {} ({} readings)",
        daily.value_column,
        daily.date,
        daily.readings.len()
    ));
    for reading in &daily.readings {
        Output::reading(&reading.time.to_string(), &reading.value.to_string(), false);
    }
    Ok(())
}

/// Print the strongest reading on a date.
pub async fn run_max(date: &str, json: bool, settings: &Settings) -> Result<()> {
    preflight(settings)?;
    let peak = open_service(settings)?.get_max(date).await?;

    if json {
        return print_json(&peak);
    }
    Output::info(&peak.to_string());
    Ok(())
}

/// Flag outliers on a date.
pub async fn run_outliers(
    date: &str,
    threshold: Option<f64>,
    json: bool,
    settings: &Settings,
) -> Result<()> {
    preflight(settings)?;
    let threshold = threshold.unwrap_or(settings.analysis.default_threshold);
    let findings = open_service(settings)?.find_outliers(date, threshold).await?;

    if json {
        return print_json(&findings);
    }

    match &findings.analysis {
        OutlierAnalysis::Report(report) if report.has_outliers() => {
            Output::warning(&format!(
                "{}: {} outlier row(s) in {}",
                findings.date,
                report.flagged_rows.len(),
                findings.value_column
            ));
            Output::kv("Samples", &report.sample_count.to_string());
            Output::kv("Mean", &format!("{:.4}", report.mean));
            Output::kv("Std dev", &format!("{:.4}", report.stddev));
            Output::kv("Range", &format!("{} .. {}", report.min, report.max));
            Output::kv("Threshold", &report.threshold.to_string());
            println!();
            for row in &report.flagged_rows {
                let value = row
                    .get(&findings.value_column)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                Output::reading(&row.to_string(), &value, true);
            }
        }
        OutlierAnalysis::Report(_) => Output::success(&findings.to_string()),
        _ => Output::info(&findings.to_string()),
    }
    Ok(())
}

/// Summarise values given on the command line.
pub fn run_analyze(values: &[f64]) -> Result<()> {
    let values: Vec<Value> = values.iter().copied().map(Value::from).collect();
    let summary = analyze_vibration_list(&values)?;

    Output::header(&format!("Summary of {} value(s)", summary.count));
    Output::kv("Mean", &format!("{:.4}", summary.mean));
    Output::kv("Variance", &format!("{:.4}", summary.variance));
    Output::kv("Max", &summary.max.to_string());
    Output::kv("Min", &summary.min.to_string());
    Ok(())
}
