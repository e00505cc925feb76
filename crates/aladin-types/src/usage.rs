//! Daily token usage types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default daily token cap when none is configured.
pub const DEFAULT_DAILY_TOKEN_LIMIT: u64 = 100_000;

/// Token usage for the current calendar day.
///
/// Only the usage governor mutates this. `tokens_used_today` may exceed
/// `daily_limit` after a rejected commit (the tokens were already spent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageState {
    pub tokens_used_today: u64,
    pub daily_limit: u64,
    pub last_reset_date: NaiveDate,
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub failed_requests: u64,
}

impl UsageState {
    /// Fresh state for `today` with nothing spent.
    pub fn new(daily_limit: u64, today: NaiveDate) -> Self {
        Self {
            tokens_used_today: 0,
            daily_limit,
            last_reset_date: today,
            total_requests: 0,
            failed_requests: 0,
        }
    }

    /// Tokens left before the cap (saturating).
    pub fn remaining(&self) -> u64 {
        self.daily_limit.saturating_sub(self.tokens_used_today)
    }

    /// Percentage of the daily limit consumed (0.0 to 100.0+).
    pub fn percent_used(&self) -> f64 {
        if self.daily_limit == 0 {
            return 0.0;
        }
        self.tokens_used_today as f64 / self.daily_limit as f64 * 100.0
    }
}

/// Snapshot of usage for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStatistics {
    pub tokens_used_today: u64,
    pub daily_limit: u64,
    pub percent_used: f64,
    pub total_requests: u64,
    pub failed_requests: u64,
    pub last_reset_date: NaiveDate,
}

impl From<&UsageState> for UsageStatistics {
    fn from(state: &UsageState) -> Self {
        Self {
            tokens_used_today: state.tokens_used_today,
            daily_limit: state.daily_limit,
            percent_used: state.percent_used(),
            total_requests: state.total_requests,
            failed_requests: state.failed_requests,
            last_reset_date: state.last_reset_date,
        }
    }
}
