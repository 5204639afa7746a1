//! Client for OpenAI-compatible chat endpoints (OpenAI, Ollama, ...).

use crate::config::LlmSettings;
use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured endpoint.
///
/// Local endpoints accept any key, so an unset key variable is not an error.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;

    let config = OpenAIConfig::new()
        .with_api_base(settings.base_url.trim_end_matches('/'))
        .with_api_key(settings.api_key());

    Ok(Client::with_config(config).with_http_client(http_client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::config::Config;

    #[test]
    fn test_client_uses_configured_base() {
        let settings = LlmSettings {
            base_url: "http://localhost:11434/v1/".to_string(),
            api_key_env: "VIBRA_TEST_UNSET_KEY".to_string(),
            ..LlmSettings::default()
        };
        let client = create_client(&settings).unwrap();
        assert_eq!(client.config().api_base(), "http://localhost:11434/v1");
    }
}
