//! Secret store port and resolution chain.
//!
//! The gateway consumes credentials only through `get(provider_id)` /
//! `set(provider_id, secret)`. Concrete stores (OS keychain, environment)
//! live in aladin-infra; `SecretChain` layers them in priority order.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use aladin_types::error::SecretError;
use aladin_types::secret::Redacted;

/// Trait for credential storage backends.
pub trait SecretStore: Send + Sync {
    /// Retrieve the credential for a provider. `None` if this store has none.
    fn get(
        &self,
        provider_id: &str,
    ) -> impl Future<Output = Result<Option<Redacted>, SecretError>> + Send;

    /// Store the credential for a provider.
    fn set(
        &self,
        provider_id: &str,
        secret: &Redacted,
    ) -> impl Future<Output = Result<(), SecretError>> + Send;
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of [`SecretStore`] for building heterogeneous chains.
pub trait SecretStoreDyn: Send + Sync {
    fn get_boxed<'a>(
        &'a self,
        provider_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Redacted>, SecretError>>;

    fn set_boxed<'a>(
        &'a self,
        provider_id: &'a str,
        secret: &'a Redacted,
    ) -> BoxFuture<'a, Result<(), SecretError>>;
}

impl<T: SecretStore> SecretStoreDyn for T {
    fn get_boxed<'a>(
        &'a self,
        provider_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Redacted>, SecretError>> {
        Box::pin(self.get(provider_id))
    }

    fn set_boxed<'a>(
        &'a self,
        provider_id: &'a str,
        secret: &'a Redacted,
    ) -> BoxFuture<'a, Result<(), SecretError>> {
        Box::pin(self.set(provider_id, secret))
    }
}

pub type DynSecretStore = Arc<dyn SecretStoreDyn>;

/// Stores consulted in priority order.
///
/// Reads return the first hit. Writes go to the first store that accepts
/// them; read-only stores (environment variables) are skipped.
pub struct SecretChain {
    stores: Vec<DynSecretStore>,
}

impl SecretChain {
    /// Stores should be ordered by precedence (highest priority first).
    pub fn new(stores: Vec<DynSecretStore>) -> Self {
        Self { stores }
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl SecretStore for SecretChain {
    async fn get(&self, provider_id: &str) -> Result<Option<Redacted>, SecretError> {
        let mut last_error = None;
        for store in &self.stores {
            match store.get_boxed(provider_id).await {
                Ok(Some(secret)) => return Ok(Some(secret)),
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(provider_id, error = %e, "secret store lookup failed");
                    last_error = Some(e);
                }
            }
        }

        // A miss everywhere is only an error if no store could answer at all.
        match last_error {
            Some(e) if self.stores.len() == 1 => Err(e),
            _ => Ok(None),
        }
    }

    async fn set(&self, provider_id: &str, secret: &Redacted) -> Result<(), SecretError> {
        for store in &self.stores {
            match store.set_boxed(provider_id, secret).await {
                Ok(()) => return Ok(()),
                Err(SecretError::ReadOnly) => continue,
                Err(e) => {
                    tracing::warn!(provider_id, error = %e, "secret store rejected write");
                    continue;
                }
            }
        }

        Err(SecretError::Unavailable(
            "no writable secret store available".to_string(),
        ))
    }
}

/// Process-local store. Secrets vanish when the process exits.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, Redacted>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with one credential.
    pub fn with_secret(provider_id: impl Into<String>, secret: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider_id.into(), Redacted::new(secret));
        store
    }
}

impl SecretStore for MemorySecretStore {
    async fn get(&self, provider_id: &str) -> Result<Option<Redacted>, SecretError> {
        Ok(self
            .secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider_id)
            .cloned())
    }

    async fn set(&self, provider_id: &str, secret: &Redacted) -> Result<(), SecretError> {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider_id.to_string(), secret.clone());
        Ok(())
    }
}

impl<T: SecretStore + ?Sized> SecretStore for Arc<T> {
    fn get(
        &self,
        provider_id: &str,
    ) -> impl Future<Output = Result<Option<Redacted>, SecretError>> + Send {
        (**self).get(provider_id)
    }

    fn set(
        &self,
        provider_id: &str,
        secret: &Redacted,
    ) -> impl Future<Output = Result<(), SecretError>> + Send {
        (**self).set(provider_id, secret)
    }
}
