//! LlmProvider trait definition.
//!
//! This is the capability interface every backend family implements. Uses
//! RPITIT so implementations can be plain `async fn`s; see `BoxLlmProvider`
//! for the object-safe wrapper.

use std::future::Future;

use aladin_types::llm::{Completion, LlmError, ProviderFamily};

/// Trait for LLM provider backends (cloud bearer-key APIs, local Ollama).
///
/// Implementations live in aladin-infra. Instances are shared read-only
/// across concurrent requests; a provider never records usage itself, it
/// returns what the backend reported and lets the caller commit it.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// The backend family this provider speaks to.
    fn family(&self) -> ProviderFamily;

    /// Send one user message (with the fixed system prompt) and return the reply.
    fn send_message(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Completion, LlmError>> + Send;

    /// The model identifier requests are sent to.
    ///
    /// May query the backend when no model is configured or cached, but
    /// always yields a usable default.
    fn current_model(&self) -> impl Future<Output = String> + Send;

    /// Models the backend offers. Best-effort: falls back to a fixed list.
    fn available_models(&self) -> impl Future<Output = Vec<String>> + Send;

    /// Cheap reachability probe.
    fn validate_connection(&self) -> impl Future<Output = bool> + Send;
}
