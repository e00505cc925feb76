//! BoxLlmProvider -- object-safe dynamic dispatch wrapper for LlmProvider.
//!
//! 1. Define an object-safe `LlmProviderDyn` trait with boxed futures
//! 2. Blanket-impl `LlmProviderDyn` for all `T: LlmProvider`
//! 3. `BoxLlmProvider` wraps `Box<dyn LlmProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use aladin_types::llm::{Completion, LlmError, ProviderFamily};

use super::provider::LlmProvider;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of [`LlmProvider`] with boxed futures.
///
/// This trait exists solely to enable dynamic dispatch (`dyn LlmProviderDyn`).
/// A blanket implementation is provided for all types implementing `LlmProvider`.
pub trait LlmProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn family(&self) -> ProviderFamily;

    fn send_message_boxed<'a>(&'a self, text: &'a str)
    -> BoxFuture<'a, Result<Completion, LlmError>>;

    fn current_model_boxed(&self) -> BoxFuture<'_, String>;

    fn available_models_boxed(&self) -> BoxFuture<'_, Vec<String>>;

    fn validate_connection_boxed(&self) -> BoxFuture<'_, bool>;
}

/// Blanket implementation: any `LlmProvider` automatically implements `LlmProviderDyn`.
impl<T: LlmProvider> LlmProviderDyn for T {
    fn name(&self) -> &str {
        LlmProvider::name(self)
    }

    fn family(&self) -> ProviderFamily {
        LlmProvider::family(self)
    }

    fn send_message_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> BoxFuture<'a, Result<Completion, LlmError>> {
        Box::pin(self.send_message(text))
    }

    fn current_model_boxed(&self) -> BoxFuture<'_, String> {
        Box::pin(self.current_model())
    }

    fn available_models_boxed(&self) -> BoxFuture<'_, Vec<String>> {
        Box::pin(self.available_models())
    }

    fn validate_connection_boxed(&self) -> BoxFuture<'_, bool> {
        Box::pin(self.validate_connection())
    }
}

/// Type-erased LLM provider for runtime provider selection.
///
/// Since `LlmProvider` uses RPITIT, it cannot be used as a trait object directly.
/// `BoxLlmProvider` provides equivalent methods that delegate to the inner
/// `LlmProviderDyn` trait object.
pub struct BoxLlmProvider {
    inner: Box<dyn LlmProviderDyn + Send + Sync>,
}

impl BoxLlmProvider {
    /// Wrap a concrete `LlmProvider` in a type-erased box.
    pub fn new<T: LlmProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn family(&self) -> ProviderFamily {
        self.inner.family()
    }

    pub async fn send_message(&self, text: &str) -> Result<Completion, LlmError> {
        self.inner.send_message_boxed(text).await
    }

    pub async fn current_model(&self) -> String {
        self.inner.current_model_boxed().await
    }

    pub async fn available_models(&self) -> Vec<String> {
        self.inner.available_models_boxed().await
    }

    pub async fn validate_connection(&self) -> bool {
        self.inner.validate_connection_boxed().await
    }
}
