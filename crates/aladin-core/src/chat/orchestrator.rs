//! ChatOrchestrator -- the caller-facing chat pipeline.
//!
//! resolve provider -> credential check -> concurrency slot -> reserve ->
//! send -> commit. No automatic retries; every failure comes back as a
//! classified [`ChatResult::Failure`].

use std::sync::{Arc, PoisonError, RwLock};

use aladin_types::llm::{ChatRequest, ChatResult, LlmError, ProviderConfig, ProviderFamily};
use aladin_types::secret::Redacted;
use aladin_types::usage::UsageStatistics;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::resolver::ProviderResolver;
use crate::secret::DynSecretStore;
use crate::usage::{UsageGovernor, estimate_tokens};

/// Runs chat requests against the active provider under the daily budget.
pub struct ChatOrchestrator {
    resolver: Arc<dyn ProviderResolver>,
    secrets: DynSecretStore,
    governor: Arc<UsageGovernor>,
    config: RwLock<ProviderConfig>,
    permits: Semaphore,
}

impl ChatOrchestrator {
    /// `max_concurrent` bounds in-flight provider calls; zero is treated as one.
    pub fn new(
        config: ProviderConfig,
        resolver: Arc<dyn ProviderResolver>,
        secrets: DynSecretStore,
        governor: Arc<UsageGovernor>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            resolver,
            secrets,
            governor,
            config: RwLock::new(config),
            permits: Semaphore::new(max_concurrent.max(1)),
        }
    }

    /// The active provider configuration.
    pub fn config(&self) -> ProviderConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switch to a new provider configuration. In-flight sends keep the
    /// provider they resolved.
    pub fn reconfigure(&self, config: ProviderConfig) {
        tracing::info!(family = %config.family, model = %config.model_name, "provider reconfigured");
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Look up the credential for `config`. Store failures count as missing.
    async fn credential(&self, config: &ProviderConfig) -> Option<Redacted> {
        match self.secrets.get_boxed(&config.credential_ref).await {
            Ok(secret) => secret,
            Err(e) => {
                tracing::warn!(provider = %config.id, error = %e, "credential lookup failed");
                None
            }
        }
    }

    async fn active_provider(&self) -> (ProviderConfig, Option<Redacted>, Arc<BoxLlmProvider>) {
        let config = self.config();
        let secret = self.credential(&config).await;
        let provider = self.resolver.resolve(&config, secret.as_ref());
        (config, secret, provider)
    }

    pub async fn send(&self, text: &str) -> ChatResult {
        self.send_cancellable(text, &CancellationToken::new()).await
    }

    /// Like [`send`](Self::send), but gives up when `cancel` fires.
    ///
    /// A cancelled send drops the in-flight HTTP call and commits nothing.
    pub async fn send_cancellable(&self, text: &str, cancel: &CancellationToken) -> ChatResult {
        let (config, secret, provider) = self.active_provider().await;
        let family = config.family;

        if family.requires_credential() && secret.as_ref().is_none_or(Redacted::is_blank) {
            tracing::warn!(family = %family, "no credential configured, request not sent");
            let err = LlmError::InvalidCredential("missing credential".to_string());
            return failure(&err, family);
        }

        let estimate = estimate_tokens(text);
        let request = ChatRequest {
            text: text.to_string(),
            estimated_tokens: u32::try_from(estimate).unwrap_or(u32::MAX),
        };

        // Budget is checked only once a slot is held, so queued sends see
        // the usage committed by the sends ahead of them.
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return failure(&LlmError::Cancelled, family),
            permit = self.permits.acquire() => match permit {
                Ok(permit) => permit,
                Err(_) => return failure(&LlmError::Cancelled, family),
            },
        };

        if !self.governor.reserve(estimate) {
            let stats = self.governor.statistics();
            let err = LlmError::QuotaExceeded {
                used: stats.tokens_used_today,
                requested: estimate,
                limit: stats.daily_limit,
            };
            tracing::warn!(used = stats.tokens_used_today, requested = estimate, "request rejected by daily quota");
            return failure(&err, family);
        }

        tracing::debug!(
            provider = provider.name(),
            estimated_tokens = request.estimated_tokens,
            "sending chat request"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(provider = provider.name(), "chat request cancelled");
                return failure(&LlmError::Cancelled, family);
            }
            outcome = provider.send_message(&request.text) => outcome,
        };

        match outcome {
            Ok(completion) => {
                let actual = completion
                    .total_tokens
                    .map(u64::from)
                    .unwrap_or(u64::from(request.estimated_tokens));
                let over_budget = match self.governor.commit(actual) {
                    Ok(_) => false,
                    Err(e) => {
                        tracing::warn!(error = %e, "response delivered past the daily limit");
                        true
                    }
                };
                ChatResult::Success {
                    text: completion.text,
                    actual_tokens: u32::try_from(actual).unwrap_or(u32::MAX),
                    over_budget,
                }
            }
            Err(err) => {
                self.governor.record_failure();
                tracing::warn!(provider = provider.name(), kind = %err.kind(), error = %err, "chat request failed");
                failure(&err, family)
            }
        }
    }

    pub async fn current_model(&self) -> String {
        let (_, _, provider) = self.active_provider().await;
        provider.current_model().await
    }

    pub async fn available_models(&self) -> Vec<String> {
        let (_, _, provider) = self.active_provider().await;
        provider.available_models().await
    }

    pub async fn validate_connection(&self) -> bool {
        let (_, _, provider) = self.active_provider().await;
        provider.validate_connection().await
    }

    pub fn usage_statistics(&self) -> UsageStatistics {
        self.governor.statistics()
    }

    pub fn is_approaching_limit(&self) -> bool {
        self.governor.is_approaching_limit()
    }
}

fn failure(err: &LlmError, family: ProviderFamily) -> ChatResult {
    ChatResult::Failure {
        kind: err.kind(),
        detail: err.user_message(family),
    }
}
