//! Secret chain builder -- wires concrete stores in priority order.
//!
//! Default order: `[EnvSecretStore, KeychainSecretStore]`. Reads take the
//! first hit; writes land in the keychain since the environment is read-only.

use std::sync::Arc;

use aladin_core::secret::{DynSecretStore, SecretChain};

use super::env::EnvSecretStore;
use super::keychain::KeychainSecretStore;

/// Build the default secret resolution chain.
///
/// - `keychain`: may be `None` on headless machines without a secret service
/// - `include_env`: whether environment variables override stored secrets
pub fn build_secret_chain(keychain: Option<KeychainSecretStore>, include_env: bool) -> SecretChain {
    let mut stores: Vec<DynSecretStore> = Vec::new();

    if include_env {
        stores.push(Arc::new(EnvSecretStore::new()));
    }

    if let Some(keychain) = keychain {
        stores.push(Arc::new(keychain));
    }

    SecretChain::new(stores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_order_and_size() {
        assert_eq!(build_secret_chain(Some(KeychainSecretStore::new()), true).len(), 2);
        assert_eq!(build_secret_chain(Some(KeychainSecretStore::new()), false).len(), 1);
        assert!(build_secret_chain(None, false).is_empty());
    }
}
