//! LLM provider abstractions for Aladin.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `ProviderResolver`: Port the factory implements to pick a provider per family

pub mod box_provider;
pub mod provider;
pub mod resolver;

/// System instruction prepended to every chat request.
pub const SYSTEM_PROMPT: &str = "You are Aladin, an AI assistant for coding in JetBrains IDEs. \
You help answer questions about code, suggest improvements, and assist with programming tasks.";
