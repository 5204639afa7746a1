//! MCP command implementation.

use super::tool_context;
use crate::config::Settings;
use crate::mcp::McpServer;
use crate::tools::ToolRegistry;
use anyhow::Result;

/// Run the MCP server.
pub async fn run_mcp(settings: &Settings) -> Result<()> {
    let server = McpServer::new(ToolRegistry::builtin(), tool_context(settings)?);
    server.run().await
}
