//! GatewayContext -- explicitly constructed gateway state.
//!
//! Holds the usage governor, the provider resolver and the secret store.
//! `init` starts the midnight reset task once; `shutdown` stops it.

use std::num::NonZeroU64;
use std::sync::Arc;

use aladin_types::config::GatewayConfig;

use crate::chat::ChatOrchestrator;
use crate::llm::resolver::ProviderResolver;
use crate::secret::DynSecretStore;
use crate::usage::UsageGovernor;

pub struct GatewayContext {
    governor: Arc<UsageGovernor>,
    resolver: Arc<dyn ProviderResolver>,
    secrets: DynSecretStore,
}

impl GatewayContext {
    /// Assemble the context and start the daily reset schedule.
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(
        governor: Arc<UsageGovernor>,
        resolver: Arc<dyn ProviderResolver>,
        secrets: DynSecretStore,
    ) -> Self {
        governor.start_reset_schedule();
        Self {
            governor,
            resolver,
            secrets,
        }
    }

    /// Build an orchestrator for `config`, applying its daily limit.
    pub fn orchestrator(&self, config: &GatewayConfig) -> ChatOrchestrator {
        if let Some(limit) = NonZeroU64::new(config.daily_token_limit) {
            self.governor.set_daily_limit(limit);
        } else {
            tracing::warn!("daily_token_limit of 0 ignored");
        }

        ChatOrchestrator::new(
            config.provider_config(),
            Arc::clone(&self.resolver),
            Arc::clone(&self.secrets),
            Arc::clone(&self.governor),
            config.max_concurrent_requests,
        )
    }

    pub fn governor(&self) -> &Arc<UsageGovernor> {
        &self.governor
    }

    pub fn secrets(&self) -> &DynSecretStore {
        &self.secrets
    }

    /// Stop background work. Idempotent.
    pub fn shutdown(&self) {
        self.governor.shutdown();
    }
}
