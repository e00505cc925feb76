//! LLM provider types for Aladin.
//!
//! These types model the provider families the gateway can talk to, the
//! per-backend configuration, chat results, and the error taxonomy every
//! backend failure is classified into.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A category of LLM backend sharing one wire protocol and auth scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily {
    /// Multi-tenant cloud API with bearer-token auth.
    #[serde(rename = "openai")]
    OpenAi,
    /// Multi-tenant cloud API with an `x-api-key` header.
    Anthropic,
    /// Self-hosted gateway with an `api-key` header and a per-tenant endpoint.
    #[serde(rename = "azure_openai")]
    AzureOpenAi,
    /// Locally hosted Ollama server, no auth.
    Ollama,
    /// Generic bearer-token endpoint supplied by the user.
    Custom,
}

impl ProviderFamily {
    /// All families, in display order.
    pub const ALL: [ProviderFamily; 5] = [
        ProviderFamily::OpenAi,
        ProviderFamily::Anthropic,
        ProviderFamily::AzureOpenAi,
        ProviderFamily::Ollama,
        ProviderFamily::Custom,
    ];

    /// Stable identifier, also used as the default credential reference.
    pub fn id(&self) -> &'static str {
        match self {
            ProviderFamily::OpenAi => "openai",
            ProviderFamily::Anthropic => "anthropic",
            ProviderFamily::AzureOpenAi => "azure_openai",
            ProviderFamily::Ollama => "ollama",
            ProviderFamily::Custom => "custom",
        }
    }

    /// Human-readable name for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderFamily::OpenAi => "OpenAI",
            ProviderFamily::Anthropic => "Anthropic",
            ProviderFamily::AzureOpenAi => "Azure OpenAI",
            ProviderFamily::Ollama => "Ollama",
            ProviderFamily::Custom => "Custom Endpoint",
        }
    }

    /// Base URL used when the configuration does not override it.
    ///
    /// Azure and custom endpoints have no sensible default and return `""`.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderFamily::OpenAi => "https://api.openai.com/v1",
            ProviderFamily::Anthropic => "https://api.anthropic.com/v1",
            ProviderFamily::AzureOpenAi => "",
            ProviderFamily::Ollama => "http://localhost:11434",
            ProviderFamily::Custom => "",
        }
    }

    /// Whether requests to this family need an API key.
    pub fn requires_credential(&self) -> bool {
        !matches!(self, ProviderFamily::Ollama)
    }

    /// Whether the user supplies the endpoint URL for this family.
    pub fn permits_custom_endpoint(&self) -> bool {
        matches!(self, ProviderFamily::AzureOpenAi | ProviderFamily::Custom)
    }

    /// Conventional environment variable holding this family's API key.
    pub fn conventional_env_var(&self) -> Option<&'static str> {
        match self {
            ProviderFamily::OpenAi => Some("OPENAI_API_KEY"),
            ProviderFamily::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderFamily::AzureOpenAi => Some("AZURE_OPENAI_API_KEY"),
            ProviderFamily::Ollama | ProviderFamily::Custom => None,
        }
    }

    /// Provider-specific remediation appended to user-facing error messages.
    pub fn remediation_hint(&self) -> &'static str {
        match self {
            ProviderFamily::OpenAi => "Check your OpenAI API key and quota.",
            ProviderFamily::Anthropic => "Check your Anthropic API key and quota.",
            ProviderFamily::AzureOpenAi => {
                "Check your Azure OpenAI API key, endpoint URL, and quota."
            }
            ProviderFamily::Ollama => "Make sure Ollama is running on your machine.",
            ProviderFamily::Custom => "Check your custom endpoint configuration.",
        }
    }
}

impl fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for ProviderFamily {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderFamily::OpenAi),
            "anthropic" => Ok(ProviderFamily::Anthropic),
            "azure_openai" | "azure" => Ok(ProviderFamily::AzureOpenAi),
            "ollama" => Ok(ProviderFamily::Ollama),
            "custom" => Ok(ProviderFamily::Custom),
            other => Err(LlmError::UnknownProviderFamily(other.to_string())),
        }
    }
}

/// Configuration for a single backend. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Identifier of this configured backend (e.g. "openai").
    pub id: String,
    pub family: ProviderFamily,
    /// Model to request. Empty means "provider default / discover".
    pub model_name: String,
    /// Endpoint override. `None` uses [`ProviderFamily::default_base_url`].
    pub base_url: Option<String>,
    /// Key under which the secret store holds this backend's credential.
    pub credential_ref: String,
}

impl ProviderConfig {
    /// Build a config for `family` with its defaults.
    pub fn for_family(family: ProviderFamily) -> Self {
        Self {
            id: family.id().to_string(),
            family,
            model_name: String::new(),
            base_url: None,
            credential_ref: family.id().to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// The base URL to use, without a trailing slash.
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(self.family.default_base_url())
            .trim()
            .trim_end_matches('/')
            .to_string()
    }
}

/// A single chat request. Created per call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub text: String,
    pub estimated_tokens: u32,
}

/// Successful provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Token usage reported by the backend, if any.
    pub total_tokens: Option<u32>,
    /// Model that served the request.
    pub model: String,
}

/// Outcome of a chat send as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChatResult {
    Success {
        text: String,
        actual_tokens: u32,
        /// The tokens were spent but pushed usage past the daily limit.
        over_budget: bool,
    },
    Failure {
        kind: ErrorKind,
        detail: String,
    },
}

impl ChatResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ChatResult::Success { .. })
    }

    /// The failure kind, if this is a failure.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ChatResult::Success { .. } => None,
            ChatResult::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Classification of every failure the gateway can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidCredential,
    NetworkUnreachable,
    Timeout,
    RateLimited,
    QuotaExceeded,
    ProtocolError,
    EndpointMisconfigured,
    UnknownProviderFamily,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidCredential => "invalid_credential",
            ErrorKind::NetworkUnreachable => "network_unreachable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::ProtocolError => "protocol_error",
            ErrorKind::EndpointMisconfigured => "endpoint_misconfigured",
            ErrorKind::UnknownProviderFamily => "unknown_provider_family",
            ErrorKind::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Errors from LLM provider operations, already classified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("daily token limit exceeded: {used} used + {requested} requested > {limit}")]
    QuotaExceeded { used: u64, requested: u64, limit: u64 },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("endpoint misconfigured: {0}")]
    EndpointMisconfigured(String),

    #[error("unknown provider family: '{0}'")]
    UnknownProviderFamily(String),

    #[error("request cancelled")]
    Cancelled,
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::InvalidCredential(_) => ErrorKind::InvalidCredential,
            LlmError::NetworkUnreachable(_) => ErrorKind::NetworkUnreachable,
            LlmError::Timeout(_) => ErrorKind::Timeout,
            LlmError::RateLimited(_) => ErrorKind::RateLimited,
            LlmError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            LlmError::Protocol(_) => ErrorKind::ProtocolError,
            LlmError::EndpointMisconfigured(_) => ErrorKind::EndpointMisconfigured,
            LlmError::UnknownProviderFamily(_) => ErrorKind::UnknownProviderFamily,
            LlmError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Backend-agnostic description of what went wrong.
    pub fn description(&self) -> String {
        match self {
            LlmError::InvalidCredential(detail) => {
                format!("Authentication error: {detail}.")
            }
            LlmError::NetworkUnreachable(_) => {
                "Network error: Could not reach the API server. Check your internet connection."
                    .to_string()
            }
            LlmError::Timeout(_) => {
                "Timeout error: The API request took too long. The service might be experiencing high load."
                    .to_string()
            }
            LlmError::RateLimited(detail) => {
                format!("Rate limit exceeded. Please try again later. ({detail})")
            }
            LlmError::QuotaExceeded { .. } => {
                "Daily token limit exceeded. Please try again tomorrow or adjust your limits in settings."
                    .to_string()
            }
            LlmError::Protocol(detail) => format!("Unexpected response from the API: {detail}."),
            LlmError::EndpointMisconfigured(detail) => {
                format!("Endpoint error: {detail}.")
            }
            LlmError::UnknownProviderFamily(family) => {
                format!("Unknown provider '{family}'.")
            }
            LlmError::Cancelled => "Request cancelled.".to_string(),
        }
    }

    /// Full user-facing message: description plus the family's remediation hint.
    ///
    /// Quota and cancellation are local conditions and carry no backend hint.
    pub fn user_message(&self, family: ProviderFamily) -> String {
        match self {
            LlmError::QuotaExceeded { .. } | LlmError::Cancelled => self.description(),
            _ => format!("{} {}", self.description(), family.remediation_hint()),
        }
    }
}
