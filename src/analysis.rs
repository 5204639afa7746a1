//! Summary statistics and z-score outlier detection over vibration readings.
//!
//! Readings are always compared by absolute value: a swing of -8 is as
//! strong as one of +8. Variance uses the population (N) divisor.

use crate::error::AnalysisError;
use crate::row::{Row, Value};
use serde::Serialize;

/// Default outlier threshold, in standard deviations.
pub const DEFAULT_THRESHOLD: f64 = 3.0;

/// Mean, spread and range of a set of absolute readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub variance: f64,
    pub stddev: f64,
    pub max: f64,
    pub min: f64,
}

impl Summary {
    /// Compute statistics, or `None` for an empty slice.
    ///
    /// Uses a running (Welford) mean and variance over values scaled by the
    /// largest magnitude, so finite input near `f64::MAX` keeps
    /// `min <= mean <= max` and a finite standard deviation.
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);

        // Identical readings have no spread, whatever rounding would say
        if max == min {
            return Some(Self {
                count: values.len(),
                mean: max,
                variance: 0.0,
                stddev: 0.0,
                max,
                min,
            });
        }

        let scale = values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        let mut mean = 0.0;
        let mut m2 = 0.0;
        for (i, v) in values.iter().enumerate() {
            let x = v / scale;
            let delta = x - mean;
            mean += delta / (i + 1) as f64;
            m2 += delta * (x - mean);
        }

        let scaled_variance = m2 / values.len() as f64;
        let stddev = scaled_variance.sqrt() * scale;

        Some(Self {
            count: values.len(),
            mean: (mean * scale).clamp(min, max),
            variance: scaled_variance * scale * scale,
            stddev,
            max,
            min,
        })
    }
}

/// Absolute numeric readings of `value_column`, skipping nulls and text.
pub fn extract_abs_values(rows: &[Row], value_column: &str) -> Vec<f64> {
    rows.iter()
        .filter_map(|row| row.get(value_column).and_then(Value::as_f64))
        .map(f64::abs)
        .collect()
}

/// Rows flagged as outliers together with the statistics that flagged them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub mean: f64,
    pub stddev: f64,
    pub max: f64,
    pub min: f64,
    pub threshold: f64,
    /// Number of rows that contributed a numeric reading.
    pub sample_count: usize,
    pub flagged_rows: Vec<Row>,
}

impl OutlierReport {
    pub fn has_outliers(&self) -> bool {
        !self.flagged_rows.is_empty()
    }
}

/// Outcome of outlier detection. Only the `Report` variant carries rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OutlierAnalysis {
    /// The query returned nothing for the requested date.
    NoRowsForDate,
    /// Every reading was identical, so no z-score exists.
    ZeroVariance { mean: f64, sample_count: usize },
    Report(OutlierReport),
}

/// Flag rows whose absolute reading lies more than `threshold` standard
/// deviations from the mean.
pub fn find_outliers(
    rows: &[Row],
    value_column: &str,
    threshold: f64,
) -> Result<OutlierAnalysis, AnalysisError> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(AnalysisError::InvalidThreshold(threshold));
    }

    if rows.is_empty() {
        return Ok(OutlierAnalysis::NoRowsForDate);
    }

    let values = extract_abs_values(rows, value_column);
    let summary = Summary::of(&values).ok_or(AnalysisError::NoNumericData)?;

    if summary.max == summary.min || summary.stddev == 0.0 {
        return Ok(OutlierAnalysis::ZeroVariance {
            mean: summary.mean,
            sample_count: summary.count,
        });
    }

    let limit = threshold * summary.stddev;
    let flagged_rows = rows
        .iter()
        .filter(|row| {
            row.get(value_column)
                .and_then(Value::as_f64)
                .is_some_and(|v| (v.abs() - summary.mean).abs() > limit)
        })
        .cloned()
        .collect();

    Ok(OutlierAnalysis::Report(OutlierReport {
        mean: summary.mean,
        stddev: summary.stddev,
        max: summary.max,
        min: summary.min,
        threshold,
        sample_count: summary.count,
        flagged_rows,
    }))
}

/// Statistics for an ad-hoc list of readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VibrationSummary {
    pub mean: f64,
    pub variance: f64,
    pub max: f64,
    pub min: f64,
    pub count: usize,
}

/// Summarise a list of readings without touching the database.
///
/// Non-numeric entries are dropped; if nothing numeric remains the input is
/// rejected.
pub fn analyze_vibration_list(values: &[Value]) -> Result<VibrationSummary, AnalysisError> {
    let abs_values: Vec<f64> = values
        .iter()
        .filter_map(Value::as_f64)
        .map(f64::abs)
        .collect();

    let summary = Summary::of(&abs_values).ok_or(AnalysisError::EmptyOrInvalidInput)?;

    Ok(VibrationSummary {
        mean: summary.mean,
        variance: summary.variance,
        max: summary.max,
        min: summary.min,
        count: summary.count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(time: &str, v: impl Into<Value>) -> Row {
        Row::new().with("id", 1i64).with("t", time).with("v", v)
    }

    fn scenario_rows() -> Vec<Row> {
        vec![
            reading("08:00", -2i64),
            reading("09:00", 100i64),
            reading("10:00", 3i64),
        ]
    }

    #[test]
    fn test_flags_single_spike() {
        let analysis = find_outliers(&scenario_rows(), "v", 1.0).unwrap();
        let OutlierAnalysis::Report(report) = analysis else {
            panic!("Expected a report");
        };

        assert!((report.mean - 35.0).abs() < 1e-9);
        assert!(report.stddev > 33.0 && report.stddev < 65.0);
        assert_eq!(report.max, 100.0);
        assert_eq!(report.min, 2.0);
        assert_eq!(report.flagged_rows.len(), 1);
        assert_eq!(report.flagged_rows[0].get("t"), Some(&Value::from("09:00")));
        // flagged rows keep every column
        assert_eq!(report.flagged_rows[0].len(), 3);
    }

    #[test]
    fn test_default_threshold_finds_nothing_in_small_sample() {
        let analysis = find_outliers(&scenario_rows(), "v", DEFAULT_THRESHOLD).unwrap();
        match analysis {
            OutlierAnalysis::Report(report) => assert!(!report.has_outliers()),
            other => panic!("Expected empty report, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_variance_is_an_outcome() {
        let rows = vec![reading("a", 5i64), reading("b", -5i64), reading("c", 5.0)];
        let analysis = find_outliers(&rows, "v", 3.0).unwrap();
        assert_eq!(
            analysis,
            OutlierAnalysis::ZeroVariance {
                mean: 5.0,
                sample_count: 3
            }
        );
    }

    #[test]
    fn test_identical_fractional_readings_have_zero_variance() {
        let rows = vec![reading("a", 0.1), reading("b", 0.1), reading("c", -0.1)];
        for threshold in [0.0, DEFAULT_THRESHOLD] {
            assert_eq!(
                find_outliers(&rows, "v", threshold).unwrap(),
                OutlierAnalysis::ZeroVariance {
                    mean: 0.1,
                    sample_count: 3
                }
            );
        }

        let summary = Summary::of(&[0.1, 0.1, 0.1]).unwrap();
        assert_eq!(summary.variance, 0.0);
        assert_eq!(summary.stddev, 0.0);
    }

    #[test]
    fn test_summary_stays_bounded_near_f64_max() {
        for values in [
            vec![1e308, 1e308],
            vec![1e308, 1.5e308, 1.7e308],
            vec![f64::MAX, f64::MAX / 2.0, 0.0],
        ] {
            let summary = Summary::of(&values).unwrap();
            assert!(summary.mean.is_finite());
            assert!(summary.min <= summary.mean && summary.mean <= summary.max);
            assert!(summary.stddev.is_finite());
        }

        let summary = analyze_vibration_list(&[Value::from(1e308), Value::from(-1e308)]).unwrap();
        assert_eq!(summary.mean, 1e308);
        assert_eq!(summary.variance, 0.0);

        let rows = vec![reading("a", 1e308), reading("b", 1.6e308), reading("c", 1.7e308)];
        let OutlierAnalysis::Report(report) = find_outliers(&rows, "v", 1.0).unwrap() else {
            panic!("Expected a report");
        };
        assert!(report.min <= report.mean && report.mean <= report.max);
        assert_eq!(report.flagged_rows.len(), 1);
    }

    #[test]
    fn test_no_rows_differs_from_no_numeric_data() {
        assert_eq!(find_outliers(&[], "v", 3.0).unwrap(), OutlierAnalysis::NoRowsForDate);

        let rows = vec![reading("a", Value::Null), reading("b", "n/a")];
        assert_eq!(find_outliers(&rows, "v", 3.0).unwrap_err(), AnalysisError::NoNumericData);

        let rows = vec![Row::new().with("t", "a")];
        assert_eq!(find_outliers(&rows, "v", 3.0).unwrap_err(), AnalysisError::NoNumericData);
    }

    #[test]
    fn test_non_numeric_rows_are_skipped_not_flagged() {
        let mut rows = scenario_rows();
        rows.insert(1, reading("08:30", Value::Null));
        let OutlierAnalysis::Report(report) = find_outliers(&rows, "v", 1.0).unwrap() else {
            panic!("Expected a report");
        };
        assert_eq!(report.sample_count, 3);
        assert_eq!(report.flagged_rows.len(), 1);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        for t in [-0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                find_outliers(&scenario_rows(), "v", t),
                Err(AnalysisError::InvalidThreshold(_))
            ));
        }
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let rows = scenario_rows();
        assert_eq!(
            find_outliers(&rows, "v", 0.5).unwrap(),
            find_outliers(&rows, "v", 0.5).unwrap()
        );
    }

    #[test]
    fn test_threshold_monotonicity() {
        let rows: Vec<Row> = [1.0, -4.0, 2.5, 40.0, -0.3, 7.0, 7.5, -19.0, 0.0, 3.3]
            .iter()
            .enumerate()
            .map(|(i, v)| reading(&format!("{:02}:00", i), *v))
            .collect();

        let mut previous = usize::MAX;
        for step in 0..=40 {
            let threshold = step as f64 * 0.1;
            let flagged = match find_outliers(&rows, "v", threshold).unwrap() {
                OutlierAnalysis::Report(report) => report.flagged_rows.len(),
                other => panic!("Expected a report, got {:?}", other),
            };
            assert!(flagged <= previous, "threshold {} flagged more rows", threshold);
            previous = flagged;
        }
    }

    #[test]
    fn test_flagged_rows_keep_original_order() {
        let rows = vec![
            reading("a", 50i64),
            reading("b", 1i64),
            reading("c", 1i64),
            reading("d", 1i64),
            reading("e", -50i64),
        ];
        let OutlierAnalysis::Report(report) = find_outliers(&rows, "v", 1.0).unwrap() else {
            panic!("Expected a report");
        };
        let times: Vec<_> = report
            .flagged_rows
            .iter()
            .map(|r| r.get("t").cloned())
            .collect();
        assert_eq!(times, vec![Some(Value::from("a")), Some(Value::from("e"))]);
    }

    #[test]
    fn test_analyze_list() {
        let values = vec![Value::from(-3i64), Value::from(1.0), Value::from("x"), Value::from(2i64)];
        let summary = analyze_vibration_list(&values).unwrap();
        assert_eq!(summary.count, 3);
        assert!((summary.mean - 2.0).abs() < 1e-12);
        assert!((summary.variance - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(summary.max, 3.0);
        assert_eq!(summary.min, 1.0);
    }

    #[test]
    fn test_analyze_list_rejects_empty_and_non_numeric() {
        assert_eq!(analyze_vibration_list(&[]).unwrap_err(), AnalysisError::EmptyOrInvalidInput);
        assert_eq!(
            analyze_vibration_list(&[Value::from("a"), Value::Null]).unwrap_err(),
            AnalysisError::EmptyOrInvalidInput
        );
    }

    #[test]
    fn test_analyze_list_bounds() {
        let lists: [&[f64]; 4] = [
            &[0.0],
            &[1.0, -1.0],
            &[0.1, 0.2, 0.30000000000000004, 1e6, -1e-6],
            &[-7.5, 3.25, 9.0, -9.0, 0.5, 2.0],
        ];
        for list in lists {
            let values: Vec<Value> = list.iter().copied().map(Value::from).collect();
            let s = analyze_vibration_list(&values).unwrap();
            assert!(s.min <= s.mean + 1e-9 && s.mean <= s.max + 1e-9);
            assert!(s.variance >= 0.0);
        }
    }
}
