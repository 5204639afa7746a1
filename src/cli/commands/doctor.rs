//! Doctor command - verify database layout and configuration.

use crate::cli::Output;
use crate::config::{LlmSettings, Settings};
use crate::executor::{QueryExecutor, SqliteExecutor};
use crate::schema::ColumnSchema;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Vibra Doctor");
    println!();
    println!("Checking database and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Database").bold());
    let db_checks = check_database(settings).await;
    for check in &db_checks {
        check.print();
    }
    checks.extend(db_checks);

    println!();

    println!("{}", style("Model Endpoint").bold());
    let llm_checks = vec![check_endpoint(&settings.llm), check_api_key(&settings.llm)];
    for check in &llm_checks {
        check.print();
    }
    checks.extend(llm_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Vibra.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Vibra is ready to use.");
    }

    Ok(())
}

/// Database file, table and column layout.
///
/// Stops at the first failing level since later checks depend on it.
async fn check_database(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let db_path = settings.sqlite_path();
    if !db_path.is_file() {
        results.push(CheckResult::error(
            "Database",
            &format!("{} not found", db_path.display()),
            "Set database.sqlite_path or VIBRA_DB_PATH",
        ));
        return results;
    }
    let size = std::fs::metadata(&db_path)
        .map(|m| format_size(m.len()))
        .unwrap_or_else(|_| "unknown size".to_string());
    results.push(CheckResult::ok(
        "Database",
        &format!("{} ({})", db_path.display(), size),
    ));

    let table = &settings.database.table;
    let columns = match SqliteExecutor::open(&db_path) {
        Ok(executor) => executor.list_columns(table).await,
        Err(e) => Err(e),
    };
    let columns = match columns {
        Ok(columns) => columns,
        Err(e) => {
            results.push(CheckResult::error(
                "Table",
                &format!("{}: {}", table, e),
                "Set database.table or VIBRA_TABLE",
            ));
            return results;
        }
    };
    results.push(CheckResult::ok(
        "Table",
        &format!("{} ({} columns)", table, columns.len()),
    ));

    results.push(check_schema(&ColumnSchema::detect(&columns), settings));
    results
}

fn check_schema(detected: &ColumnSchema, settings: &Settings) -> CheckResult {
    match detected.resolve(&settings.value_column_policy()) {
        Ok(schema) if detected.value_candidates.len() > 1 && settings.database.value_column.is_none() => {
            CheckResult::warning(
                "Columns",
                &format!(
                    "using {} out of {}",
                    schema.value_column(),
                    detected.value_candidates.join(", ")
                ),
                "Pin one with database.value_column",
            )
        }
        Ok(schema) => CheckResult::ok(
            "Columns",
            &format!("value={}, time={}", schema.value_column(), schema.time_column()),
        ),
        Err(e) => CheckResult::error(
            "Columns",
            &e.to_string(),
            "The table needs a column named like 'vibration' and one like 'time' or 'date'",
        ),
    }
}

fn check_endpoint(llm: &LlmSettings) -> CheckResult {
    let kind = if llm.is_local() { "local" } else { "remote" };
    CheckResult::ok(
        "Endpoint",
        &format!("{} ({}, model {})", llm.base_url, kind, llm.model),
    )
}

/// Local endpoints need no key, so a missing one is only a warning there.
fn check_api_key(llm: &LlmSettings) -> CheckResult {
    let name = llm.api_key_env.as_str();
    let key = llm.api_key();

    if !key.is_empty() {
        return CheckResult::ok(name, &format!("configured ({})", mask_key(&key)));
    }
    if llm.is_local() {
        return CheckResult::ok(name, "not set (not needed for a local endpoint)");
    }
    CheckResult::warning(
        name,
        "not set",
        &format!("Needed for agent and chat. Set with: export {}='sk-...'", name),
    )
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: vibra config edit",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("short"), "***");
        assert_eq!(mask_key("sk-abcdefghijklmnop1234"), "sk-abcd...1234");
    }

    #[test]
    fn test_schema_check_warns_on_ambiguity() {
        let settings = Settings::default();
        let detected = ColumnSchema::detect(&["rec_datetime", "vibration_x", "vibration_y"]);
        let result = check_schema(&detected, &settings);
        assert_eq!(result.status, CheckStatus::Warning);
        assert!(result.message.contains("vibration_x"));

        let detected = ColumnSchema::detect(&["id", "vibration"]);
        assert_eq!(check_schema(&detected, &settings).status, CheckStatus::Error);
    }

    #[tokio::test]
    async fn test_database_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensors.db");
        let mut settings = Settings::default();
        settings.database.sqlite_path = path.display().to_string();
        settings.database.table = "vib".to_string();

        let results = check_database(&settings).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Error);

        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE vib (rec_time TEXT, vibration REAL);")
            .unwrap();
        drop(conn);

        let results = check_database(&settings).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.status == CheckStatus::Ok));
    }
}
