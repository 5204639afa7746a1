//! Configuration settings for Vibra.

use crate::analysis::DEFAULT_THRESHOLD;
use crate::error::{Result, VibraError};
use crate::schema::ValueColumnPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub database: DatabaseSettings,
    pub analysis: AnalysisSettings,
    pub llm: LlmSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error), used when no `-v` is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.vibra".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// How the value column is chosen when several match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguityMode {
    /// Take the first matching column (default).
    #[default]
    First,
    /// Fail when more than one column matches.
    Error,
}

impl std::str::FromStr for AmbiguityMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(AmbiguityMode::First),
            "error" => Ok(AmbiguityMode::Error),
            _ => Err(format!("Unknown ambiguity mode: {}", s)),
        }
    }
}

impl std::fmt::Display for AmbiguityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmbiguityMode::First => write!(f, "first"),
            AmbiguityMode::Error => write!(f, "error"),
        }
    }
}

/// Sensor database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite database holding sensor readings.
    pub sqlite_path: String,
    /// Table with the readings.
    pub table: String,
    /// Explicit value column. Skips name matching when set.
    pub value_column: Option<String>,
    /// What to do when several columns mention "vibration".
    pub on_ambiguity: AmbiguityMode,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.vibra/sensors.db".to_string(),
            table: "vibration_log".to_string(),
            value_column: None,
            on_ambiguity: AmbiguityMode::First,
        }
    }
}

/// Outlier analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Default outlier threshold in standard deviations.
    pub default_threshold: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Model endpoint settings. Any OpenAI-compatible API works (OpenAI, Ollama).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the chat completions API.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Model used for the agent and chat.
    pub model: String,
    /// Maximum model round trips per agent run.
    pub max_turns: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Replaces the built-in agent instructions.
    pub system_prompt: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_turns: 10,
            timeout_secs: 300,
            system_prompt: None,
        }
    }
}

impl LlmSettings {
    /// API key from the configured environment variable (empty if unset).
    pub fn api_key(&self) -> String {
        std::env::var(&self.api_key_env).unwrap_or_default()
    }

    /// Whether the endpoint is on this machine (local models need no key).
    pub fn is_local(&self) -> bool {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h == "localhost" || h == "127.0.0.1"))
            .unwrap_or(false)
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Settings {
    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied on top of the file.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `VIBRA_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("VIBRA_DB_PATH") {
            self.database.sqlite_path = v;
        }
        if let Some(v) = lookup("VIBRA_TABLE") {
            self.database.table = v;
        }
        if let Some(v) = lookup("VIBRA_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = lookup("VIBRA_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("VIBRA_ON_AMBIGUITY") {
            self.database.on_ambiguity = v
                .parse()
                .map_err(|e| VibraError::Config(format!("VIBRA_ON_AMBIGUITY: {}", e)))?;
        }
        Ok(())
    }

    /// Reject settings that would only fail later.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.llm.base_url).map_err(|e| {
            VibraError::Config(format!("llm.base_url '{}' is not a URL: {}", self.llm.base_url, e))
        })?;

        let t = self.analysis.default_threshold;
        if !t.is_finite() || t < 0.0 {
            return Err(VibraError::Config(format!(
                "analysis.default_threshold must be >= 0, got {}",
                t
            )));
        }

        if self.general.log_level.parse::<tracing::Level>().is_err() {
            return Err(VibraError::Config(format!(
                "general.log_level '{}' is not one of trace, debug, info, warn, error",
                self.general.log_level
            )));
        }

        if self.llm.max_turns == 0 {
            return Err(VibraError::Config("llm.max_turns must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Column selection policy derived from the database settings.
    pub fn value_column_policy(&self) -> crate::schema::ValueColumnPolicy {
        match (&self.database.value_column, self.database.on_ambiguity) {
            (Some(column), _) => ValueColumnPolicy::Column(column.clone()),
            (None, AmbiguityMode::First) => ValueColumnPolicy::First,
            (None, AmbiguityMode::Error) => ValueColumnPolicy::ErrorOnAmbiguity,
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| VibraError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vibra")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.database.sqlite_path)
    }
}
