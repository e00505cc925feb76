//! LocalProvider -- [`LlmProvider`] for a local Ollama server.
//!
//! No authentication. When no model is configured the first model the
//! server reports is used; discovery results are cached on the instance.

pub mod types;

use std::sync::{PoisonError, RwLock};

use reqwest::StatusCode;

use aladin_core::llm::SYSTEM_PROMPT;
use aladin_core::llm::provider::LlmProvider;
use aladin_types::llm::{Completion, LlmError, ProviderConfig, ProviderFamily};

use self::types::{ErrorResponse, GenerateRequest, GenerateResponse, TagList};
use super::http;

pub const DEFAULT_MODEL: &str = "phi3";

/// Offered when the server cannot be asked, in order of preference.
pub const FALLBACK_MODELS: [&str; 5] = ["phi3", "phi2", "llama2", "mistral", "gemma"];

pub struct LocalProvider {
    client: reqwest::Client,
    listing_client: reqwest::Client,
    probe_client: reqwest::Client,
    base_url: String,
    configured_model: Option<String>,
    discovered: RwLock<Option<Vec<String>>>,
}

impl LocalProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        let configured_model = Some(config.model_name.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        Self {
            client: http::build_client(http::CHAT_CONNECT_TIMEOUT, http::CHAT_TIMEOUT),
            listing_client: http::probe_client(http::PROBE_TIMEOUT),
            probe_client: http::probe_client(http::CONNECTIVITY_TIMEOUT),
            base_url: config.effective_base_url(),
            configured_model,
            discovered: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn cached_first(&self) -> Option<String> {
        self.discovered
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|models| models.first().cloned())
    }

    /// Ask the server for its models. `None` on any failure.
    async fn discover(&self) -> Option<Vec<String>> {
        let response = match self.listing_client.get(self.url("/api/tags")).send().await {
            Ok(response) if response.status() == StatusCode::OK => response,
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "ollama model listing rejected");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to get ollama models");
                return None;
            }
        };

        match response.json::<TagList>().await {
            Ok(list) if !list.models.is_empty() => {
                let names: Vec<String> = list.models.into_iter().map(|m| m.name).collect();
                *self.discovered.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(names.clone());
                Some(names)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable ollama model listing");
                None
            }
        }
    }
}

impl LlmProvider for LocalProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Ollama
    }

    async fn send_message(&self, text: &str) -> Result<Completion, LlmError> {
        let model = self.current_model().await;
        let url = self.url("/api/generate");
        tracing::debug!(url = %url, model = %model, "sending ollama generate");

        let body = GenerateRequest {
            model: &model,
            prompt: text,
            system: SYSTEM_PROMPT,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::classify_transport(&e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| "Unknown error".to_string());
            tracing::warn!(status = status.as_u16(), error = %message, "ollama generate failed");
            return Err(http::classify_status(status, message));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Protocol(format!("failed to parse response: {e}")))?;

        Ok(Completion {
            total_tokens: parsed.total_tokens(),
            model: parsed.model.unwrap_or(model),
            text: parsed.response,
        })
    }

    async fn current_model(&self) -> String {
        if let Some(model) = &self.configured_model {
            return model.clone();
        }
        if let Some(model) = self.cached_first() {
            return model;
        }
        self.discover()
            .await
            .and_then(|models| models.into_iter().next())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    async fn available_models(&self) -> Vec<String> {
        match self.discover().await {
            Some(models) => models,
            None => FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }

    async fn validate_connection(&self) -> bool {
        match self.probe_client.get(self.url("/api/tags")).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!(error = %e, "ollama connection probe failed");
                false
            }
        }
    }
}
