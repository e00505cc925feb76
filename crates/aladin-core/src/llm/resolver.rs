//! Provider resolution port.

use std::sync::Arc;

use aladin_types::llm::ProviderConfig;
use aladin_types::secret::Redacted;

use super::box_provider::BoxLlmProvider;

/// Maps a provider configuration (plus its credential) to a ready provider.
///
/// Resolution never fails: families without a dedicated implementation fall
/// back to the default cloud provider so the assistant stays usable while the
/// configuration is corrected. Implementations may cache instances per family.
pub trait ProviderResolver: Send + Sync {
    fn resolve(&self, config: &ProviderConfig, secret: Option<&Redacted>) -> Arc<BoxLlmProvider>;
}

impl<T: ProviderResolver + ?Sized> ProviderResolver for Arc<T> {
    fn resolve(&self, config: &ProviderConfig, secret: Option<&Redacted>) -> Arc<BoxLlmProvider> {
        (**self).resolve(config, secret)
    }
}
