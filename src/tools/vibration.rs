//! Vibration tools and the clock tool.

use super::{parse_args, ToolContext, ToolOutput, ToolSpec};
use crate::analysis::analyze_vibration_list;
use crate::error::Result;
use crate::row::Value as Cell;
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct DateArgs {
    #[serde(alias = "date_str")]
    date: String,
}

#[derive(Debug, Deserialize)]
struct OutlierArgs {
    #[serde(alias = "date_str")]
    date: String,
    #[serde(default)]
    threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    values: Vec<Value>,
}

fn date_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "date": {
                "type": "string",
                "description": "Calendar date in YYYY-MM-DD form"
            }
        },
        "required": ["date"]
    })
}

pub(super) fn specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "get_vibration_all_on_date",
            description: "Get every vibration reading for a date, ordered by time. \
                Readings are absolute values. Use this to retrieve raw data.",
            input_schema: date_schema(),
            handler: get_all,
        },
        ToolSpec {
            name: "get_vibration_max_on_date",
            description: "Get the largest absolute vibration reading for a date \
                and the time it occurred.",
            input_schema: date_schema(),
            handler: get_max,
        },
        ToolSpec {
            name: "find_vibration_outliers_on_date",
            description: "Flag readings on a date whose absolute value lies more than \
                `threshold` standard deviations from that day's mean. \
                Returns every column of each flagged row.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "date": {
                        "type": "string",
                        "description": "Calendar date in YYYY-MM-DD form"
                    },
                    "threshold": {
                        "type": "number",
                        "description": "Outlier boundary in standard deviations (default: 3.0)",
                        "default": 3.0,
                        "minimum": 0
                    }
                },
                "required": ["date"]
            }),
            handler: find_outliers,
        },
        ToolSpec {
            name: "analyze_vibration_list",
            description: "Compute mean, variance, max and min of a list of vibration \
                values (absolute values are used). No database access.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "values": {
                        "type": "array",
                        "items": { "type": "number" },
                        "description": "Vibration readings"
                    }
                },
                "required": ["values"]
            }),
            handler: analyze_list,
        },
        ToolSpec {
            name: "current_time",
            description: "Get the current local date and time (RFC 3339).",
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
            handler: current_time,
        },
    ]
}

fn get_all<'a>(ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, Result<ToolOutput>> {
    Box::pin(async move {
        let args: DateArgs = parse_args("get_vibration_all_on_date", args)?;
        let readings = ctx.service.get_all(&args.date).await?;
        ToolOutput::from_outcome(&readings)
    })
}

fn get_max<'a>(ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, Result<ToolOutput>> {
    Box::pin(async move {
        let args: DateArgs = parse_args("get_vibration_max_on_date", args)?;
        let peak = ctx.service.get_max(&args.date).await?;
        ToolOutput::from_outcome(&peak)
    })
}

fn find_outliers<'a>(ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, Result<ToolOutput>> {
    Box::pin(async move {
        let args: OutlierArgs = parse_args("find_vibration_outliers_on_date", args)?;
        let threshold = args.threshold.unwrap_or(ctx.default_threshold);
        let findings = ctx.service.find_outliers(&args.date, threshold).await?;
        ToolOutput::from_outcome(&findings)
    })
}

fn analyze_list<'a>(_ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, Result<ToolOutput>> {
    Box::pin(async move {
        let args: ListArgs = parse_args("analyze_vibration_list", args)?;
        let values: Vec<Cell> = args.values.into_iter().map(Cell::from).collect();
        let summary = analyze_vibration_list(&values)?;

        Ok(ToolOutput {
            text: format!(
                "mean={}, variance={}, max={}, min={} ({} values)",
                summary.mean, summary.variance, summary.max, summary.min, summary.count
            ),
            data: serde_json::to_value(summary)?,
        })
    })
}

fn current_time<'a>(_ctx: &'a ToolContext, _args: Value) -> BoxFuture<'a, Result<ToolOutput>> {
    Box::pin(async move {
        let now = chrono::Local::now().to_rfc3339();
        Ok(ToolOutput {
            data: json!({ "now": now }),
            text: now,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_context;
    use super::super::ToolRegistry;
    use crate::error::{AnalysisError, VibraError};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_get_all_tool() {
        let ctx = test_context();
        let out = ToolRegistry::builtin()
            .invoke(&ctx, "get_vibration_all_on_date", json!({ "date": "2025-07-27" }))
            .await
            .unwrap();
        assert_eq!(out.text.lines().count(), 3);
        assert_eq!(out.data["readings"][1]["value"], json!(100.0));
    }

    #[tokio::test]
    async fn test_accepts_date_str_alias() {
        let ctx = test_context();
        let out = ToolRegistry::builtin()
            .invoke(&ctx, "get_vibration_max_on_date", json!({ "date_str": "2025-07-27" }))
            .await
            .unwrap();
        assert_eq!(out.data["peak"]["time"], "2025-07-27 09:00:00");
    }

    #[tokio::test]
    async fn test_outliers_use_default_threshold() {
        let ctx = test_context();
        let registry = ToolRegistry::builtin();

        let out = registry
            .invoke(&ctx, "find_vibration_outliers_on_date", json!({ "date": "2025-07-27" }))
            .await
            .unwrap();
        assert_eq!(out.data["outcome"], "report");
        assert_eq!(out.data["threshold"], json!(3.0));
        assert_eq!(out.data["flagged_rows"].as_array().unwrap().len(), 0);

        let out = registry
            .invoke(
                &ctx,
                "find_vibration_outliers_on_date",
                json!({ "date": "2025-07-27", "threshold": 1.0 }),
            )
            .await
            .unwrap();
        assert_eq!(out.data["flagged_rows"][0]["machine"], "press");
        assert!(out.text.contains("1. rec_datetime: 2025-07-27 09:00:00"));
    }

    #[tokio::test]
    async fn test_outliers_missing_date_is_invalid_input() {
        let ctx = test_context();
        let err = assert_err!(
            ToolRegistry::builtin()
                .invoke(&ctx, "find_vibration_outliers_on_date", json!({ "threshold": 1.0 }))
                .await
        );
        assert!(matches!(err, VibraError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_analyze_list_tool() {
        let ctx = test_context();
        let registry = ToolRegistry::builtin();

        let out = registry
            .invoke(&ctx, "analyze_vibration_list", json!({ "values": [-2, 4, "x"] }))
            .await
            .unwrap();
        assert_eq!(out.data["mean"], json!(3.0));
        assert_eq!(out.data["variance"], json!(1.0));
        assert_eq!(out.data["count"], json!(2));

        let err = assert_err!(
            registry
                .invoke(&ctx, "analyze_vibration_list", json!({ "values": [] }))
                .await
        );
        assert!(matches!(
            err,
            VibraError::Analysis(AnalysisError::EmptyOrInvalidInput)
        ));
    }

    #[tokio::test]
    async fn test_current_time_is_rfc3339() {
        let ctx = test_context();
        let out = ToolRegistry::builtin()
            .invoke(&ctx, "current_time", serde_json::Value::Null)
            .await
            .unwrap();
        assert_ok!(chrono::DateTime::parse_from_rfc3339(&out.text));
    }
}
