//! Persistence of the daily usage state in `{data_dir}/usage.json`.

use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aladin_core::usage::{Clock, UsageGovernor};
use aladin_types::usage::UsageState;

pub const USAGE_FILE: &str = "usage.json";

#[derive(Debug, thiserror::Error)]
pub enum UsageStoreError {
    #[error("usage file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("usage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON file holding one [`UsageState`].
pub struct UsageStore {
    path: PathBuf,
}

impl UsageStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(USAGE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved state. `Ok(None)` when nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<UsageState>, UsageStoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write the state, replacing the file atomically.
    pub async fn save(&self, state: &UsageState) -> Result<(), UsageStoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Build a governor from the saved state, or a fresh one.
    ///
    /// A corrupt file is logged and ignored. The configured `daily_limit`
    /// replaces whatever limit was saved.
    pub async fn load_governor(&self, daily_limit: NonZeroU64, clock: Arc<dyn Clock>) -> UsageGovernor {
        match self.load().await {
            Ok(Some(state)) => {
                let governor = UsageGovernor::restore(state, clock);
                governor.set_daily_limit(daily_limit);
                governor
            }
            Ok(None) => UsageGovernor::with_clock(daily_limit, clock),
            Err(e) => {
                tracing::warn!("Failed to load {}: {e}, starting fresh", self.path.display());
                UsageGovernor::with_clock(daily_limit, clock)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use aladin_core::usage::SystemClock;
    use tempfile::TempDir;

    use super::*;

    fn limit(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(UsageStore::new(tmp.path()).load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let store = UsageStore::new(tmp.path());
        let mut state = UsageState::new(5000, SystemClock.today());
        state.tokens_used_today = 1234;
        state.total_requests = 9;
        store.save(&state).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(state));
        assert!(!tmp.path().join("usage.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_creates_data_dir() {
        let tmp = TempDir::new().unwrap();
        let store = UsageStore::new(&tmp.path().join("nested"));
        store
            .save(&UsageState::new(10, SystemClock.today()))
            .await
            .unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_load_governor_restores_today_and_applies_limit() {
        let tmp = TempDir::new().unwrap();
        let store = UsageStore::new(tmp.path());
        let mut state = UsageState::new(5000, SystemClock.today());
        state.tokens_used_today = 700;
        store.save(&state).await.unwrap();

        let governor = store.load_governor(limit(800), Arc::new(SystemClock)).await;
        let stats = governor.statistics();
        assert_eq!(stats.tokens_used_today, 700);
        assert_eq!(stats.daily_limit, 800);
    }

    #[tokio::test]
    async fn test_load_governor_ignores_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(USAGE_FILE), "{not json")
            .await
            .unwrap();

        let store = UsageStore::new(tmp.path());
        assert!(matches!(store.load().await, Err(UsageStoreError::Json(_))));
        let governor = store.load_governor(limit(100), Arc::new(SystemClock)).await;
        assert_eq!(governor.statistics().tokens_used_today, 0);
    }
}
