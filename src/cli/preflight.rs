//! Pre-flight checks before expensive operations.
//!
//! Validates that the database and LLM configuration are usable before
//! starting operations that would otherwise fail midway.

use crate::config::{LlmSettings, Settings};
use crate::error::{Result, VibraError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Direct queries need the database file.
    Query,
    /// Streaming chat only talks to the model.
    Chat,
    /// The agent needs both.
    Agent,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Query => check_database(settings)?,
        Operation::Chat => check_api_key(&settings.llm)?,
        Operation::Agent => {
            check_api_key(&settings.llm)?;
            check_database(settings)?;
        }
    }
    Ok(())
}

/// Local endpoints (Ollama and friends) accept any key.
fn check_api_key(llm: &LlmSettings) -> Result<()> {
    if llm.is_local() || !llm.api_key().is_empty() {
        return Ok(());
    }
    Err(VibraError::Config(format!(
        "{} not set. Set it with: export {}='sk-...' or point llm.base_url at a local server",
        llm.api_key_env, llm.api_key_env
    )))
}

/// The database must already exist; querying never creates it.
fn check_database(settings: &Settings) -> Result<()> {
    let path = settings.sqlite_path();
    if path.is_file() {
        Ok(())
    } else {
        Err(VibraError::Config(format!(
            "Database not found at {}. Set database.sqlite_path or VIBRA_DB_PATH",
            path.display()
        )))
    }
}
