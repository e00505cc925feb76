//! Global configuration types for Aladin.
//!
//! `GatewayConfig` represents the `config.toml` the settings surface writes:
//! which provider family is active, model and endpoint overrides, and the
//! daily token limit.

use serde::{Deserialize, Serialize};

use crate::llm::{ProviderConfig, ProviderFamily};
use crate::usage::DEFAULT_DAILY_TOKEN_LIMIT;

/// Top-level gateway configuration.
///
/// Loaded from `~/.aladin/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Provider family id (e.g. "openai", "ollama"). Kept as a string so an
    /// unknown value degrades to the default family instead of failing to load.
    #[serde(default = "default_provider_family")]
    pub provider_family: String,

    /// Model override. Empty uses the provider default.
    #[serde(default)]
    pub model_name: String,

    /// Base URL override for families with a fixed default endpoint.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Endpoint for families that require one (Azure OpenAI, custom).
    #[serde(default)]
    pub custom_endpoint: Option<String>,

    /// Daily token cap shared across all requests.
    #[serde(default = "default_daily_token_limit")]
    pub daily_token_limit: u64,

    /// Maximum number of chat requests in flight at once.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_provider_family() -> String {
    ProviderFamily::OpenAi.id().to_string()
}

fn default_daily_token_limit() -> u64 {
    DEFAULT_DAILY_TOKEN_LIMIT
}

fn default_max_concurrent_requests() -> usize {
    4
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider_family: default_provider_family(),
            model_name: String::new(),
            base_url: None,
            custom_endpoint: None,
            daily_token_limit: default_daily_token_limit(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

impl GatewayConfig {
    /// Parse the configured family, falling back to OpenAI when unknown.
    pub fn family(&self) -> ProviderFamily {
        self.provider_family
            .parse()
            .unwrap_or(ProviderFamily::OpenAi)
    }

    /// Build the immutable provider configuration for the active family.
    ///
    /// Families that take a user-supplied endpoint read it from
    /// `custom_endpoint`; the rest use `base_url`.
    pub fn provider_config(&self) -> ProviderConfig {
        let family = self.family();
        let endpoint = if family.permits_custom_endpoint() {
            self.custom_endpoint.clone()
        } else {
            self.base_url.clone()
        };

        ProviderConfig {
            id: family.id().to_string(),
            family,
            model_name: self.model_name.trim().to_string(),
            base_url: endpoint,
            credential_ref: family.id().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_config_default_values() {
        let config = GatewayConfig::default();
        assert_eq!(config.provider_family, "openai");
        assert_eq!(config.daily_token_limit, 100_000);
        assert_eq!(config.max_concurrent_requests, 4);
    }

    #[test]
    fn test_gateway_config_deserialize_with_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn test_gateway_config_deserialize_with_values() {
        let toml_str = r#"
provider_family = "ollama"
model_name = "llama3"
base_url = "http://10.0.0.5:11434"
daily_token_limit = 5000
"#;
        let config: GatewayConfig = toml::from_str(toml_str).unwrap();
        let provider = config.provider_config();
        assert_eq!(provider.family, ProviderFamily::Ollama);
        assert_eq!(provider.model_name, "llama3");
        assert_eq!(provider.effective_base_url(), "http://10.0.0.5:11434");
        assert_eq!(config.daily_token_limit, 5000);
    }

    #[test]
    fn test_unknown_family_falls_back_to_openai() {
        let config = GatewayConfig {
            provider_family: "watsonx".into(),
            ..GatewayConfig::default()
        };
        assert_eq!(config.family(), ProviderFamily::OpenAi);
    }

    #[test]
    fn test_custom_family_uses_custom_endpoint() {
        let config = GatewayConfig {
            provider_family: "custom".into(),
            base_url: Some("https://ignored.example.com".into()),
            custom_endpoint: Some("https://llm.internal.example.com/v1/models".into()),
            ..GatewayConfig::default()
        };
        let provider = config.provider_config();
        assert_eq!(
            provider.base_url.as_deref(),
            Some("https://llm.internal.example.com/v1/models")
        );
        assert_eq!(provider.credential_ref, "custom");
    }
}
