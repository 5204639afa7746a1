//! CLI module for Vibra.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Vibra - machine vibration analysis
///
/// Queries a sensor log table for one day of vibration readings, finds the peak
/// and flags outliers. Also runs an LLM agent over the same tools.
#[derive(Parser, Debug)]
#[command(name = "vibra")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIBRA_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check database, table layout and LLM configuration
    Doctor,

    /// Show the table's columns and which ones are used
    Columns,

    /// List every reading on a date
    All {
        /// Date as YYYY-MM-DD
        date: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the reading with the largest absolute vibration on a date
    Max {
        /// Date as YYYY-MM-DD
        date: String,

        #[arg(long)]
        json: bool,
    },

    /// Flag readings more than THRESHOLD standard deviations from the mean
    Outliers {
        /// Date as YYYY-MM-DD
        date: String,

        /// Z-score threshold (defaults to analysis.default_threshold)
        #[arg(short, long)]
        threshold: Option<f64>,

        #[arg(long)]
        json: bool,
    },

    /// Summarise a list of values (mean, variance, max, min)
    Analyze {
        /// Values to summarise
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<f64>,
    },

    /// Run the maintenance agent on a question
    Agent {
        /// The question or task, e.g. "Was the vibration on 2025-07-28 abnormal?"
        task: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Send one message to the model and stream the reply
    Chat {
        /// The message to send
        message: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start HTTP API server exposing the tools
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start MCP server for AI assistant integration
    Mcp,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

/// Tracing filter directive for this crate.
///
/// Any `-v` replaces `configured` (`general.log_level`).
pub fn log_filter(verbose: u8, configured: &str) -> String {
    let level = match verbose {
        0 => configured.to_lowercase(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    format!("vibra={}", level)
}
