//! Environment variable secret store.
//!
//! Read-only. For a provider id such as `openai` it checks
//! `ALADIN_OPENAI_API_KEY` first, then the family's conventional variable
//! (`OPENAI_API_KEY`).

use aladin_core::secret::SecretStore;
use aladin_types::error::SecretError;
use aladin_types::llm::ProviderFamily;
use aladin_types::secret::Redacted;

#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }

    /// Variable names consulted for `provider_id`, in order.
    pub fn candidate_vars(provider_id: &str) -> Vec<String> {
        let mut vars = vec![format!(
            "ALADIN_{}_API_KEY",
            provider_id.replace('-', "_").to_uppercase()
        )];
        if let Some(conventional) = provider_id
            .parse::<ProviderFamily>()
            .ok()
            .and_then(|family| family.conventional_env_var())
        {
            vars.push(conventional.to_string());
        }
        vars
    }
}

impl SecretStore for EnvSecretStore {
    async fn get(&self, provider_id: &str) -> Result<Option<Redacted>, SecretError> {
        for var in Self::candidate_vars(provider_id) {
            match std::env::var(&var) {
                Ok(value) if !value.trim().is_empty() => return Ok(Some(Redacted::new(value))),
                // Unset, empty, or not Unicode: keep looking.
                _ => continue,
            }
        }
        Ok(None)
    }

    async fn set(&self, _provider_id: &str, _secret: &Redacted) -> Result<(), SecretError> {
        Err(SecretError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_vars() {
        assert_eq!(
            EnvSecretStore::candidate_vars("openai"),
            vec!["ALADIN_OPENAI_API_KEY", "OPENAI_API_KEY"]
        );
        assert_eq!(
            EnvSecretStore::candidate_vars("azure_openai"),
            vec!["ALADIN_AZURE_OPENAI_API_KEY", "AZURE_OPENAI_API_KEY"]
        );
        assert_eq!(
            EnvSecretStore::candidate_vars("my-proxy"),
            vec!["ALADIN_MY_PROXY_API_KEY"]
        );
    }

    #[tokio::test]
    async fn test_env_store_get_existing() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("ALADIN_ENVTEST_ONE_API_KEY", "tok-123") };

        let secret = EnvSecretStore::new().get("envtest-one").await.unwrap();
        assert_eq!(secret.unwrap().expose(), "tok-123");

        // SAFETY: as above.
        unsafe { std::env::remove_var("ALADIN_ENVTEST_ONE_API_KEY") };
    }

    #[tokio::test]
    async fn test_env_store_skips_empty_value() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("ALADIN_ENVTEST_TWO_API_KEY", "  ") };

        let secret = EnvSecretStore::new().get("envtest-two").await.unwrap();
        assert!(secret.is_none());

        // SAFETY: as above.
        unsafe { std::env::remove_var("ALADIN_ENVTEST_TWO_API_KEY") };
    }

    #[tokio::test]
    async fn test_env_store_get_missing() {
        let secret = EnvSecretStore::new().get("nonexistent-xyz-123").await.unwrap();
        assert!(secret.is_none());
    }

    #[tokio::test]
    async fn test_env_store_is_read_only() {
        let result = EnvSecretStore::new()
            .set("openai", &Redacted::new("sk"))
            .await;
        assert!(matches!(result, Err(SecretError::ReadOnly)));
    }
}
