//! CLI command implementations.

mod agent;
mod chat;
mod config;
mod doctor;
mod mcp;
mod query;
mod serve;

pub use agent::run_agent;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use mcp::run_mcp;
pub use query::{run_all, run_analyze, run_columns, run_max, run_outliers};
pub use serve::run_serve;

use crate::config::Settings;
use crate::executor::SqliteExecutor;
use crate::service::VibrationService;
use crate::tools::ToolContext;
use std::sync::Arc;

/// Open the configured database and wrap it in a service.
pub(crate) fn open_service(settings: &Settings) -> crate::Result<Arc<VibrationService>> {
    let executor = SqliteExecutor::open(&settings.sqlite_path())?;
    let service = VibrationService::new(
        Arc::new(executor),
        &settings.database.table,
        settings.value_column_policy(),
    )?;
    Ok(Arc::new(service))
}

/// Tool context over the configured database.
pub(crate) fn tool_context(settings: &Settings) -> crate::Result<ToolContext> {
    Ok(ToolContext::new(
        open_service(settings)?,
        settings.analysis.default_threshold,
    ))
}
