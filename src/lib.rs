//! Vibra - machine vibration analysis over a sensor log
//!
//! Answers questions about one day of vibration readings stored in a SQL
//! table: every reading, the peak by absolute value, and z-score outliers.
//! The same operations are exposed as tools to an LLM agent, an MCP server
//! and an HTTP API.
//!
//! # Architecture
//!
//! - `schema` - find the vibration and time columns of a table
//! - `query` - build parameterised daily statements from validated identifiers
//! - `executor` - run statements against a backend (SQLite)
//! - `analysis` - summary statistics and outlier flagging
//! - `service` - the pipeline above behind one API
//! - `tools` - named tools over the service
//! - `agent` - tool-calling agent loop and streaming chat
//! - `mcp` - JSON-RPC server over stdio
//! - `config` - configuration management
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vibra::executor::SqliteExecutor;
//! use vibra::schema::ValueColumnPolicy;
//! use vibra::service::VibrationService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let executor = SqliteExecutor::open("sensors.db".as_ref())?;
//!     let service = VibrationService::new(Arc::new(executor), "vibration_log", ValueColumnPolicy::First)?;
//!
//!     let findings = service.find_outliers("2025-07-28", 3.0).await?;
//!     println!("{}", findings);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod mcp;
pub mod openai;
pub mod query;
pub mod row;
pub mod schema;
pub mod service;
pub mod tools;

pub use error::{Result, VibraError};
