//! LLM provider implementations.
//!
//! Contains the concrete [`LlmProvider`](aladin_core::llm::provider::LlmProvider)
//! implementations (hosted Chat Completions APIs and local Ollama) and the
//! [`ProviderFactory`] that picks one per provider family.

pub mod cloud;
mod http;
pub mod local;

use std::sync::Arc;

use dashmap::DashMap;
use secrecy::SecretString;

use aladin_core::llm::box_provider::BoxLlmProvider;
use aladin_core::llm::resolver::ProviderResolver;
use aladin_types::llm::{ProviderConfig, ProviderFamily};
use aladin_types::secret::Redacted;

use self::cloud::CloudProvider;
use self::local::LocalProvider;

pub(crate) use self::http::{
    CONNECTIVITY_TIMEOUT, PROBE_TIMEOUT, classify_transport, probe_client,
};

/// Construct a provider for `config`.
///
/// Ollama gets the local provider; every other family speaks the Chat
/// Completions protocol. Families without a dedicated implementation fall
/// back to it with a warning instead of failing.
pub fn create_provider(config: &ProviderConfig, secret: Option<&Redacted>) -> BoxLlmProvider {
    let api_key = || SecretString::from(secret.map(Redacted::expose).unwrap_or_default());

    match config.family {
        ProviderFamily::Ollama => BoxLlmProvider::new(LocalProvider::new(config)),
        ProviderFamily::OpenAi | ProviderFamily::Custom => {
            BoxLlmProvider::new(CloudProvider::new(config, api_key()))
        }
        ProviderFamily::Anthropic | ProviderFamily::AzureOpenAi => {
            tracing::warn!(
                family = %config.family,
                "no dedicated chat implementation, using the Chat Completions provider"
            );
            BoxLlmProvider::new(CloudProvider::new(config, api_key()))
        }
    }
}

struct CachedProvider {
    config: ProviderConfig,
    secret: Option<Redacted>,
    provider: Arc<BoxLlmProvider>,
}

/// Caching [`ProviderResolver`]: at most one live provider per family.
///
/// The entry for a family is replaced when its configuration or credential
/// changes.
#[derive(Default)]
pub struct ProviderFactory {
    cache: DashMap<ProviderFamily, CachedProvider>,
}

impl ProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn cached(&self) -> usize {
        self.cache.len()
    }

    #[cfg(test)]
    fn clear(&self) {
        self.cache.clear();
    }
}

impl ProviderResolver for ProviderFactory {
    fn resolve(&self, config: &ProviderConfig, secret: Option<&Redacted>) -> Arc<BoxLlmProvider> {
        if let Some(entry) = self.cache.get(&config.family) {
            if entry.config == *config && entry.secret.as_ref() == secret {
                return Arc::clone(&entry.provider);
            }
        }

        tracing::debug!(family = %config.family, model = %config.model_name, "constructing provider");
        let provider = Arc::new(create_provider(config, secret));
        self.cache.insert(
            config.family,
            CachedProvider {
                config: config.clone(),
                secret: secret.cloned(),
                provider: Arc::clone(&provider),
            },
        );
        provider
    }
}
