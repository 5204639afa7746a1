//! HTTP API server for integration with other systems.
//!
//! Exposes the tool registry over REST: list the tools, then call one by name
//! with its JSON arguments as the request body.

use super::tool_context;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::VibraError;
use crate::tools::{ToolContext, ToolRegistry};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    registry: ToolRegistry,
    context: ToolContext,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: &Settings) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        registry: ToolRegistry::builtin(),
        context: tool_context(settings)?,
    });

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Vibra API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("List tools", "GET  /tools");
    Output::kv("Call tool", "POST /tools/{name}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(call_tool))
        .layer(cors)
        .with_state(state)
}

// === Response Types ===

#[derive(Serialize)]
struct ToolInfo {
    name: &'static str,
    description: &'static str,
    input_schema: Value,
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_tools(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tools: Vec<ToolInfo> = state
        .registry
        .specs()
        .iter()
        .map(|spec| ToolInfo {
            name: spec.name,
            description: spec.description,
            input_schema: spec.input_schema.clone(),
        })
        .collect();

    Json(ToolListResponse {
        total: tools.len(),
        tools,
    })
}

/// Run a tool. An empty body means no arguments.
async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Option<Json<Value>>,
) -> Response {
    if state.registry.get(&name).is_none() {
        return error_response(StatusCode::NOT_FOUND, format!("Unknown tool: {}", name));
    }

    let arguments = body.map(|Json(v)| v).unwrap_or(Value::Null);
    match state.registry.invoke(&state.context, &name, arguments).await {
        Ok(output) => Json(output).into_response(),
        Err(e) => {
            warn!("Tool {} failed: {}", name, e);
            error_response(status_for(&e), e.to_string())
        }
    }
}

/// Caller mistakes are 4xx, everything else is a server fault.
fn status_for(err: &VibraError) -> StatusCode {
    match err {
        VibraError::InvalidInput(_) | VibraError::Query(_) | VibraError::Analysis(_) => {
            StatusCode::BAD_REQUEST
        }
        VibraError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalysisError, QueryError, SchemaError};
    use crate::executor::SqliteExecutor;
    use crate::schema::ValueColumnPolicy;
    use crate::service::VibrationService;
    use rusqlite::Connection;
    use serde_json::json;

    fn state() -> Arc<AppState> {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE vib (rec_datetime TEXT, vibration REAL);
            INSERT INTO vib VALUES ('2025-07-27 08:00:00', -2), ('2025-07-27 09:00:00', 7);
            "#,
        )
        .unwrap();
        let executor = Arc::new(SqliteExecutor::from_connection(conn));
        let service = VibrationService::new(executor, "vib", ValueColumnPolicy::First).unwrap();
        Arc::new(AppState {
            registry: ToolRegistry::builtin(),
            context: ToolContext::new(Arc::new(service), 3.0),
        })
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&VibraError::Query(QueryError::InvalidDate("x".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&VibraError::Analysis(AnalysisError::InvalidThreshold(-1.0))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&VibraError::Schema(SchemaError::NoValueColumn)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&VibraError::Execution("disk I/O error".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_call_tool_statuses() {
        let state = state();

        let ok = call_tool(
            State(state.clone()),
            Path("get_vibration_max_on_date".to_string()),
            Some(Json(json!({ "date": "2025-07-27" }))),
        )
        .await;
        assert_eq!(ok.status(), StatusCode::OK);

        let unknown = call_tool(State(state.clone()), Path("web_search".to_string()), None).await;
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let bad_date = call_tool(
            State(state),
            Path("get_vibration_all_on_date".to_string()),
            Some(Json(json!({ "date": "yesterday" }))),
        )
        .await;
        assert_eq!(bad_date.status(), StatusCode::BAD_REQUEST);
    }
}
