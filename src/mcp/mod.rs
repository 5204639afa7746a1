//! MCP (Model Context Protocol) server for Vibra.
//!
//! Lets MCP clients call the vibration tools.
//! Implements JSON-RPC 2.0 over stdio.

mod protocol;
mod server;

pub use server::McpServer;
