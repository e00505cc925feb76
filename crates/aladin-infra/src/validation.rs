//! CredentialValidator -- per-family credential and endpoint checks.
//!
//! Each family does one minimal GET with bounded timeouts and maps the
//! status to a [`ValidationResult`]. Transport failures become a classified
//! `false` verdict; nothing here returns an error. Holds no mutable state,
//! so validations may run in parallel.

use reqwest::StatusCode;

use aladin_types::llm::{ProviderConfig, ProviderFamily};
use aladin_types::secret::Redacted;
use aladin_types::validation::ValidationResult;

use crate::llm::{CONNECTIVITY_TIMEOUT, PROBE_TIMEOUT, classify_transport, probe_client};

const AZURE_API_VERSION: &str = "2023-05-15";

/// How much of an Ollama error body is echoed back.
const OLLAMA_BODY_EXCERPT: usize = 100;

pub struct CredentialValidator {
    client: reqwest::Client,
    connectivity_client: reqwest::Client,
}

impl Default for CredentialValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialValidator {
    pub fn new() -> Self {
        Self {
            client: probe_client(PROBE_TIMEOUT),
            connectivity_client: probe_client(CONNECTIVITY_TIMEOUT),
        }
    }

    /// Validate `secret` (and the endpoint, where the family takes one).
    pub async fn validate(
        &self,
        config: &ProviderConfig,
        secret: Option<&Redacted>,
    ) -> ValidationResult {
        let family = config.family;
        let key = secret.map(Redacted::expose).unwrap_or_default().trim();

        if family.requires_credential() && key.is_empty() {
            return ValidationResult::invalid("API key is empty. Please configure in Settings.");
        }

        let result = match family {
            ProviderFamily::OpenAi => self.validate_openai(config, key).await,
            ProviderFamily::Anthropic => self.validate_anthropic(config, key).await,
            ProviderFamily::AzureOpenAi => self.validate_azure(config, key).await,
            ProviderFamily::Ollama => self.validate_ollama(config).await,
            ProviderFamily::Custom => self.validate_custom(config, key).await,
        };

        tracing::info!(family = %family, ok = result.ok, "credential validation finished");
        result
    }

    async fn validate_openai(&self, config: &ProviderConfig, key: &str) -> ValidationResult {
        let url = format!("{}/models", config.effective_base_url());
        let response = match self.client.get(&url).bearer_auth(key).send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(&e, config.family),
        };

        match response.status().as_u16() {
            200 => ValidationResult::valid("OpenAI API key is valid"),
            401 => ValidationResult::invalid("Invalid API key"),
            429 => ValidationResult::invalid("Rate limit exceeded"),
            code => failed_with(code),
        }
    }

    async fn validate_anthropic(&self, config: &ProviderConfig, key: &str) -> ValidationResult {
        let url = format!("{}/models", config.effective_base_url());
        let response = match self.client.get(&url).header("x-api-key", key).send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(&e, config.family),
        };

        match response.status().as_u16() {
            200 => ValidationResult::valid("Anthropic API key is valid"),
            401 => ValidationResult::invalid("Invalid API key"),
            403 => ValidationResult::invalid("Forbidden - key may be revoked"),
            429 => ValidationResult::invalid("Rate limit exceeded"),
            code => failed_with(code),
        }
    }

    async fn validate_azure(&self, config: &ProviderConfig, key: &str) -> ValidationResult {
        let endpoint = endpoint(config);
        if endpoint.is_empty() || !endpoint.starts_with("https://") {
            return ValidationResult::invalid(
                "Invalid Azure endpoint URL. It should start with https://",
            );
        }

        let url = format!("{endpoint}/openai/deployments?api-version={AZURE_API_VERSION}");
        let response = match self.client.get(&url).header("api-key", key).send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(&e, config.family),
        };

        match response.status().as_u16() {
            200 => ValidationResult::valid("Azure OpenAI API key is valid"),
            401 => ValidationResult::invalid("Invalid API key"),
            403 => ValidationResult::invalid("Forbidden - check key and permissions"),
            404 => ValidationResult::invalid("Not found - endpoint URL may be incorrect"),
            code => failed_with(code),
        }
    }

    async fn validate_ollama(&self, config: &ProviderConfig) -> ValidationResult {
        let base_url = config.effective_base_url();
        if base_url.is_empty() {
            return ValidationResult::invalid("Ollama server URL is empty.");
        }

        let url = format!("{base_url}/api/tags");
        let response = match self.connectivity_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(&e, config.family),
        };

        let status = response.status();
        if status == StatusCode::OK {
            return ValidationResult::valid("Successfully connected to Ollama server.");
        }

        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(OLLAMA_BODY_EXCERPT).collect();
        ValidationResult::invalid(format!(
            "Failed to connect to Ollama server. Response code: {}. {excerpt}",
            status.as_u16()
        ))
    }

    async fn validate_custom(&self, config: &ProviderConfig, key: &str) -> ValidationResult {
        let endpoint = endpoint(config);
        if endpoint.is_empty() {
            return ValidationResult::invalid("Custom endpoint URL is empty");
        }
        if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
            return ValidationResult::invalid(
                "Invalid endpoint URL. It should start with http:// or https://",
            );
        }

        let response = match self.client.get(&endpoint).bearer_auth(key).send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(&e, config.family),
        };

        match response.status().as_u16() {
            200 | 204 => ValidationResult::valid("Custom endpoint validation successful"),
            401 | 403 => ValidationResult::invalid("Authentication failed - check API key"),
            404 => ValidationResult::invalid("Endpoint not found - check URL"),
            code => failed_with(code),
        }
    }
}

/// The user-supplied endpoint, trimmed, without a trailing slash.
fn endpoint(config: &ProviderConfig) -> String {
    config
        .base_url
        .as_deref()
        .unwrap_or_default()
        .trim()
        .trim_end_matches('/')
        .to_string()
}

fn failed_with(code: u16) -> ValidationResult {
    ValidationResult::invalid(format!("Validation failed with code: {code}"))
}

fn transport_failure(err: &reqwest::Error, family: ProviderFamily) -> ValidationResult {
    let classified = classify_transport(err);
    tracing::warn!(family = %family, error = %classified, "validation request failed");
    ValidationResult::invalid(classified.user_message(family))
}
