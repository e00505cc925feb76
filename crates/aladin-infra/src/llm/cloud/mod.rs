//! CloudProvider -- [`LlmProvider`] for hosted Chat Completions APIs.
//!
//! Speaks `POST {base}/chat/completions`, authenticating with a bearer key
//! (or the family's key header). Used for OpenAI and custom endpoints, and
//! as the fallback for families without a dedicated implementation.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the auth header.

pub mod types;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use aladin_core::llm::SYSTEM_PROMPT;
use aladin_core::llm::provider::LlmProvider;
use aladin_types::llm::{Completion, LlmError, ProviderConfig, ProviderFamily};

use self::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ErrorEnvelope, ModelList,
};
use super::http;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub const FALLBACK_MODELS: [&str; 3] = ["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo"];

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1000;

/// Hosted bearer-key provider.
pub struct CloudProvider {
    client: reqwest::Client,
    probe_client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    family: ProviderFamily,
}

// No Debug: keep the key and client internals out of logs entirely.

impl CloudProvider {
    pub fn new(config: &ProviderConfig, api_key: SecretString) -> Self {
        let model = if config.model_name.trim().is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            config.model_name.trim().to_string()
        };

        Self {
            client: http::build_client(http::CHAT_CONNECT_TIMEOUT, http::CHAT_TIMEOUT),
            probe_client: http::probe_client(http::PROBE_TIMEOUT),
            api_key,
            base_url: config.effective_base_url(),
            model,
            family: config.family,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the credential the way the family expects it.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.family {
            ProviderFamily::AzureOpenAi => request.header("api-key", self.api_key.expose_secret()),
            ProviderFamily::Anthropic => request.header("x-api-key", self.api_key.expose_secret()),
            _ => request.bearer_auth(self.api_key.expose_secret()),
        }
    }

    fn build_request<'a>(&'a self, text: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    fn has_key(&self) -> bool {
        !self.api_key.expose_secret().trim().is_empty()
    }
}

impl LlmProvider for CloudProvider {
    fn name(&self) -> &str {
        self.family.id()
    }

    fn family(&self) -> ProviderFamily {
        self.family
    }

    async fn send_message(&self, text: &str) -> Result<Completion, LlmError> {
        let url = self.url("/chat/completions");
        tracing::debug!(url = %url, model = %self.model, "sending chat completion");

        let response = self
            .authorize(self.client.post(&url))
            .json(&self.build_request(text))
            .send()
            .await
            .map_err(|e| http::classify_transport(&e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|env| env.error)
                .and_then(|err| err.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            tracing::warn!(status = status.as_u16(), error = %message, "chat completion failed");
            return Err(http::classify_status(status, message));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Protocol(format!("failed to parse response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Protocol("response contained no choices".to_string()))?;

        let total_tokens = parsed.usage.map(|u| u.total_tokens);
        tracing::debug!(tokens = ?total_tokens, "chat completion succeeded");

        Ok(Completion {
            text,
            total_tokens,
            model: parsed.model.unwrap_or_else(|| self.model.clone()),
        })
    }

    async fn current_model(&self) -> String {
        self.model.clone()
    }

    async fn available_models(&self) -> Vec<String> {
        let fallback = || -> Vec<String> { FALLBACK_MODELS.iter().map(|m| m.to_string()).collect() };

        let response = match self
            .authorize(self.probe_client.get(self.url("/models")))
            .send()
            .await
        {
            Ok(response) if response.status() == StatusCode::OK => response,
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "model listing rejected");
                return fallback();
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to list models");
                return fallback();
            }
        };

        match response.json::<ModelList>().await {
            Ok(list) if !list.data.is_empty() => list.data.into_iter().map(|m| m.id).collect(),
            Ok(_) => fallback(),
            Err(e) => {
                tracing::warn!(error = %e, "unparseable model listing");
                fallback()
            }
        }
    }

    async fn validate_connection(&self) -> bool {
        if !self.has_key() {
            return false;
        }
        match self
            .authorize(self.probe_client.get(self.url("/models")))
            .send()
            .await
        {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!(error = %e, "connection probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use aladin_types::llm::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider(server: &MockServer, key: &str) -> CloudProvider {
        let config = ProviderConfig::for_family(ProviderFamily::OpenAi).with_base_url(server.uri());
        CloudProvider::new(&config, SecretString::from(key.to_string()))
    }

    #[test]
    fn test_default_model() {
        let config = ProviderConfig::for_family(ProviderFamily::OpenAi);
        let provider = CloudProvider::new(&config, SecretString::from("sk-test".to_string()));
        assert_eq!(provider.model, "gpt-3.5-turbo");
        assert_eq!(provider.url("/models"), "https://api.openai.com/v1/models");
    }

    #[test]
    fn test_configured_model_wins() {
        let config = ProviderConfig::for_family(ProviderFamily::Custom)
            .with_model("llama-3-70b")
            .with_base_url("https://llm.internal.example/v1/");
        let provider = CloudProvider::new(&config, SecretString::from("tok".to_string()));
        assert_eq!(provider.name(), "custom");
        assert_eq!(provider.model, "llama-3-70b");
        assert_eq!(
            provider.url("/chat/completions"),
            "https://llm.internal.example/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_send_message_wire_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_json(json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": "What does ? do in Rust?"}
                ],
                "temperature": 0.7,
                "max_tokens": 1000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "model": "gpt-3.5-turbo-0125",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "It propagates errors."}}],
                "usage": {"prompt_tokens": 40, "completion_tokens": 6, "total_tokens": 46}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = provider(&server, "sk-test")
            .send_message("What does ? do in Rust?")
            .await
            .unwrap();
        assert_eq!(completion.text, "It propagates errors.");
        assert_eq!(completion.total_tokens, Some(46));
        assert_eq!(completion.model, "gpt-3.5-turbo-0125");
    }

    #[tokio::test]
    async fn test_rate_limit_message_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "Rate limit reached for gpt-3.5-turbo", "type": "requests"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server, "sk-test").send_message("hi").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.to_string().contains("Rate limit reached"));
    }

    #[tokio::test]
    async fn test_unauthorized_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server, "sk-bad").send_message("hi").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredential);
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = provider(&server, "sk-test").send_message("hi").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolError);
    }

    #[tokio::test]
    async fn test_empty_choices_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider(&server, "sk-test").send_message("hi").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolError);
    }

    #[tokio::test]
    async fn test_available_models_from_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [{"id": "gpt-4o", "object": "model"}, {"id": "gpt-4o-mini", "object": "model"}]
            })))
            .mount(&server)
            .await;

        let models = provider(&server, "sk-test").available_models().await;
        assert_eq!(models, vec!["gpt-4o", "gpt-4o-mini"]);
    }

    #[tokio::test]
    async fn test_available_models_fallback_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let models = provider(&server, "sk-test").available_models().await;
        assert_eq!(models, vec!["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo"]);
    }

    #[tokio::test]
    async fn test_validate_connection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        assert!(provider(&server, "sk-test").validate_connection().await);
        assert!(!provider(&server, "sk-other").validate_connection().await);
    }

    #[tokio::test]
    async fn test_validate_connection_blank_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert!(!provider(&server, "  ").validate_connection().await);
    }

    #[tokio::test]
    async fn test_azure_uses_api_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("api-key", "azure-key"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let config =
            ProviderConfig::for_family(ProviderFamily::AzureOpenAi).with_base_url(server.uri());
        let provider = CloudProvider::new(&config, SecretString::from("azure-key".to_string()));
        assert!(provider.validate_connection().await);
    }

    #[tokio::test]
    async fn test_anthropic_uses_x_api_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("x-api-key", "sk-ant"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config =
            ProviderConfig::for_family(ProviderFamily::Anthropic).with_base_url(server.uri());
        let provider = CloudProvider::new(&config, SecretString::from("sk-ant".to_string()));
        assert!(provider.validate_connection().await);
    }
}
