//! Application state wiring the gateway together.
//!
//! AppState pins the gateway ports to the concrete infra implementations:
//! the caching provider factory, the env + keychain secret chain and the
//! JSON usage store.

use std::num::NonZeroU64;
use std::path::PathBuf;
use std::sync::Arc;

use aladin_core::chat::ChatOrchestrator;
use aladin_core::context::GatewayContext;
use aladin_core::usage::SystemClock;
use aladin_infra::config::{load_gateway_config, resolve_data_dir};
use aladin_infra::llm::ProviderFactory;
use aladin_infra::secret::chain::build_secret_chain;
use aladin_infra::secret::keychain::KeychainSecretStore;
use aladin_infra::usage_store::UsageStore;
use aladin_infra::validation::CredentialValidator;
use aladin_types::config::GatewayConfig;
use aladin_types::usage::DEFAULT_DAILY_TOKEN_LIMIT;

/// Shared application state used by every CLI command.
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: GatewayConfig,
    pub context: GatewayContext,
    pub orchestrator: ChatOrchestrator,
    pub validator: CredentialValidator,
    pub usage_store: UsageStore,
}

impl AppState {
    /// Load config and usage from the data directory and wire the gateway.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_gateway_config(&data_dir).await;

        let secrets = Arc::new(build_secret_chain(Some(KeychainSecretStore::new()), true));

        let limit = NonZeroU64::new(config.daily_token_limit)
            .or(NonZeroU64::new(DEFAULT_DAILY_TOKEN_LIMIT))
            .ok_or_else(|| anyhow::anyhow!("daily token limit must be positive"))?;
        let usage_store = UsageStore::new(&data_dir);
        let governor = usage_store.load_governor(limit, Arc::new(SystemClock)).await;

        let context = GatewayContext::init(
            Arc::new(governor),
            Arc::new(ProviderFactory::new()),
            secrets,
        );
        let orchestrator = context.orchestrator(&config);

        tracing::debug!(
            data_dir = %data_dir.display(),
            family = %config.family(),
            "gateway initialized"
        );

        Ok(Self {
            data_dir,
            config,
            context,
            orchestrator,
            validator: CredentialValidator::new(),
            usage_store,
        })
    }

    /// Persist the governor's current usage.
    pub async fn save_usage(&self) -> anyhow::Result<()> {
        let state = self.context.governor().snapshot();
        self.usage_store.save(&state).await?;
        Ok(())
    }

    /// Stop the reset task. Idempotent.
    pub fn shutdown(&self) {
        self.context.shutdown();
    }
}
