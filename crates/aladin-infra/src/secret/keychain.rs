//! OS keychain secret store.
//!
//! Uses the `keyring` crate (macOS Keychain, Linux Secret Service, Windows
//! Credential Manager). Entries live under service `aladin` with the
//! provider's credential ref as the account.

use aladin_core::secret::SecretStore;
use aladin_types::error::SecretError;
use aladin_types::secret::Redacted;

pub const DEFAULT_SERVICE: &str = "aladin";

pub struct KeychainSecretStore {
    service_name: String,
}

impl KeychainSecretStore {
    pub fn new() -> Self {
        Self::with_service(DEFAULT_SERVICE)
    }

    /// Use a different service name (tests, side-by-side installs).
    pub fn with_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, provider_id: &str) -> Result<keyring::Entry, SecretError> {
        keyring::Entry::new(&self.service_name, provider_id)
            .map_err(|e| SecretError::Unavailable(format!("keychain entry error: {e}")))
    }

    /// Remove the stored credential. Missing entries are not an error.
    pub fn delete(&self, provider_id: &str) -> Result<(), SecretError> {
        match self.entry(provider_id)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecretError::Unavailable(format!("keychain delete error: {e}"))),
        }
    }
}

impl Default for KeychainSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for KeychainSecretStore {
    async fn get(&self, provider_id: &str) -> Result<Option<Redacted>, SecretError> {
        let entry = self.entry(provider_id)?;

        match entry.get_password() {
            Ok(value) => Ok(Some(Redacted::new(value))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SecretError::Unavailable(format!("keychain get error: {e}"))),
        }
    }

    async fn set(&self, provider_id: &str, secret: &Redacted) -> Result<(), SecretError> {
        self.entry(provider_id)?
            .set_password(secret.expose())
            .map_err(|e| SecretError::Unavailable(format!("keychain set error: {e}")))?;
        tracing::info!(provider_id, "credential stored in keychain");
        Ok(())
    }
}
