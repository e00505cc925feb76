//! UsageGovernor -- daily token budget with a midnight reset.
//!
//! All reads and writes of [`UsageState`] happen under one mutex; `reserve`
//! and `commit` are separate critical sections. Two requests may therefore
//! both pass `reserve` before either commits and overshoot the limit by at
//! most one request's estimate.

use std::num::NonZeroU64;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use aladin_types::error::CommitError;
use aladin_types::usage::{UsageState, UsageStatistics};
use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::clock::{Clock, SystemClock};

/// Extra delay after midnight so the local date has definitely changed.
const RESET_SLACK: Duration = Duration::from_secs(1);

/// Usage is "approaching the limit" above 80% (integer form: used/limit > 4/5).
const WARNING_NUMERATOR: u64 = 4;
const WARNING_DENOMINATOR: u64 = 5;

struct ResetSchedule {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Sole owner of the daily usage state and its reset task.
pub struct UsageGovernor {
    state: Mutex<UsageState>,
    clock: Arc<dyn Clock>,
    schedule: Mutex<Option<ResetSchedule>>,
}

impl UsageGovernor {
    /// Create a governor with the given daily limit, using the system clock.
    pub fn new(daily_limit: NonZeroU64) -> Self {
        Self::with_clock(daily_limit, Arc::new(SystemClock))
    }

    pub fn with_clock(daily_limit: NonZeroU64, clock: Arc<dyn Clock>) -> Self {
        let state = UsageState::new(daily_limit.get(), clock.today());
        Self {
            state: Mutex::new(state),
            clock,
            schedule: Mutex::new(None),
        }
    }

    /// Rebuild a governor from persisted state.
    ///
    /// Applies the rollover check immediately, so state saved on an earlier
    /// day comes back zeroed. A persisted limit of zero is treated as one.
    pub fn restore(mut state: UsageState, clock: Arc<dyn Clock>) -> Self {
        state.daily_limit = state.daily_limit.max(1);
        rollover(&mut state, clock.today());
        Self {
            state: Mutex::new(state),
            clock,
            schedule: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, UsageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the state with the rollover check applied.
    fn lock_current(&self) -> MutexGuard<'_, UsageState> {
        let mut state = self.lock();
        rollover(&mut state, self.clock.today());
        state
    }

    /// Whether a request of `estimate` tokens fits in today's remaining budget.
    ///
    /// Does not mutate usage.
    pub fn reserve(&self, estimate: u64) -> bool {
        let state = self.lock_current();
        state.tokens_used_today.saturating_add(estimate) <= state.daily_limit
    }

    /// Record tokens actually spent. Returns the new daily total.
    ///
    /// If the new total exceeds the limit the commit is rejected, but the
    /// tokens are still recorded: they were already spent upstream.
    pub fn commit(&self, actual: u64) -> Result<u64, CommitError> {
        let mut state = self.lock_current();
        state.tokens_used_today = state.tokens_used_today.saturating_add(actual);
        state.total_requests += 1;

        if state.tokens_used_today > state.daily_limit {
            state.failed_requests += 1;
            tracing::warn!(
                used = state.tokens_used_today,
                limit = state.daily_limit,
                committed = actual,
                "daily token limit exceeded"
            );
            return Err(CommitError {
                tokens_used_today: state.tokens_used_today,
                daily_limit: state.daily_limit,
            });
        }

        if is_approaching(&state) {
            tracing::debug!(
                used = state.tokens_used_today,
                limit = state.daily_limit,
                "approaching daily token limit"
            );
        }

        Ok(state.tokens_used_today)
    }

    /// Count a provider call that failed without spending tokens.
    pub fn record_failure(&self) {
        let mut state = self.lock_current();
        state.total_requests += 1;
        state.failed_requests += 1;
    }

    /// Zero today's usage if the local date moved past `last_reset_date`.
    ///
    /// Returns whether a reset happened. Idempotent within a day.
    pub fn rollover_if_new_day(&self) -> bool {
        let mut state = self.lock();
        rollover(&mut state, self.clock.today())
    }

    /// Unconditionally zero today's usage.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.tokens_used_today = 0;
        state.last_reset_date = self.clock.today();
        tracing::info!("token usage reset");
    }

    /// `tokens_used_today > 0.8 * daily_limit`. Equality is not approaching.
    pub fn is_approaching_limit(&self) -> bool {
        is_approaching(&self.lock_current())
    }

    pub fn statistics(&self) -> UsageStatistics {
        UsageStatistics::from(&*self.lock_current())
    }

    /// Raw copy of the state for persistence. No rollover is applied.
    pub fn snapshot(&self) -> UsageState {
        self.lock().clone()
    }

    /// Change the daily limit without losing today's usage.
    pub fn set_daily_limit(&self, limit: NonZeroU64) {
        let mut state = self.lock();
        if state.daily_limit != limit.get() {
            tracing::info!(old = state.daily_limit, new = limit.get(), "daily token limit changed");
            state.daily_limit = limit.get();
        }
    }

    pub fn daily_limit(&self) -> u64 {
        self.lock().daily_limit
    }

    /// Start the recurring midnight reset task on the current tokio runtime.
    ///
    /// Returns `false` if a schedule is already running. The task holds only a
    /// weak reference, so it never keeps the governor alive.
    pub fn start_reset_schedule(self: &Arc<Self>) -> bool {
        let mut schedule = self.schedule.lock().unwrap_or_else(PoisonError::into_inner);
        if schedule.as_ref().is_some_and(|s| !s.handle.is_finished()) {
            return false;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let governor = Arc::downgrade(self);
        let clock = Arc::clone(&self.clock);

        let handle = tokio::spawn(async move {
            loop {
                let delay = clock.until_next_midnight() + RESET_SLACK;
                tracing::debug!(secs = delay.as_secs(), "next usage reset scheduled");

                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }

                let Some(governor) = governor.upgrade() else {
                    break;
                };
                if governor.rollover_if_new_day() {
                    tracing::info!("daily token usage reset at midnight");
                }
            }
        });

        *schedule = Some(ResetSchedule { cancel, handle });
        tracing::info!("scheduled daily token usage reset");
        true
    }

    pub fn is_schedule_running(&self) -> bool {
        self.schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|s| !s.handle.is_finished())
    }

    /// Cancel the reset task. Safe to call any number of times.
    pub fn shutdown(&self) {
        let taken = self
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(schedule) = taken {
            schedule.cancel.cancel();
            tracing::debug!("usage reset schedule cancelled");
        }
    }
}

impl Drop for UsageGovernor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn rollover(state: &mut UsageState, today: NaiveDate) -> bool {
    if state.last_reset_date == today {
        return false;
    }
    tracing::info!(
        previous = %state.last_reset_date,
        today = %today,
        tokens = state.tokens_used_today,
        "new day, resetting token usage"
    );
    state.tokens_used_today = 0;
    state.last_reset_date = today;
    true
}

fn is_approaching(state: &UsageState) -> bool {
    // u128 so large limits cannot overflow the cross-multiplication.
    u128::from(state.tokens_used_today) * u128::from(WARNING_DENOMINATOR)
        > u128::from(state.daily_limit) * u128::from(WARNING_NUMERATOR)
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use super::*;
    use crate::usage::clock::manual::ManualClock;
    use crate::usage::estimate::estimate_tokens;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn limit(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    fn governor_on(date: NaiveDate, daily_limit: u64) -> (UsageGovernor, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(date));
        let governor = UsageGovernor::with_clock(limit(daily_limit), clock.clone());
        (governor, clock)
    }

    #[test]
    fn test_limit_300_scenario() {
        let (governor, _) = governor_on(day(14), 300);
        assert_eq!(governor.commit(100).unwrap(), 100);
        assert_eq!(governor.commit(150).unwrap(), 250);
        assert!(governor.is_approaching_limit());
        assert!(!governor.reserve(60));
        assert!(governor.reserve(50));
    }

    #[test]
    fn test_reserve_does_not_mutate() {
        let (governor, _) = governor_on(day(14), 1000);
        assert!(governor.reserve(400));
        assert!(governor.reserve(400));
        assert_eq!(governor.statistics().tokens_used_today, 0);
    }

    #[test]
    fn test_commits_within_limit_never_block_fitting_reserves() {
        let (governor, _) = governor_on(day(14), 1000);
        for chunk in [100, 250, 300, 200] {
            let remaining = 1000 - governor.statistics().tokens_used_today;
            assert!(governor.reserve(remaining));
            governor.commit(chunk).unwrap();
        }
        assert!(governor.reserve(150));
        assert!(!governor.reserve(151));
    }

    #[test]
    fn test_approaching_limit_boundary() {
        let (governor, _) = governor_on(day(14), 1000);
        governor.commit(800).unwrap();
        assert!(!governor.is_approaching_limit());
        governor.commit(1).unwrap();
        assert!(governor.is_approaching_limit());
    }

    #[test]
    fn test_over_limit_commit_is_rejected_but_recorded() {
        let (governor, _) = governor_on(day(14), 300);
        governor.commit(250).unwrap();
        assert!(governor.reserve(50));

        let err = governor.commit(80).unwrap_err();
        assert_eq!(err.tokens_used_today, 330);
        assert_eq!(err.daily_limit, 300);

        let stats = governor.statistics();
        assert_eq!(stats.tokens_used_today, 330);
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.failed_requests, 1);
        assert!(!governor.reserve(1));
    }

    #[test]
    fn test_rollover_on_new_day() {
        let (governor, clock) = governor_on(day(14), 500);
        governor.commit(480).unwrap();
        assert!(!governor.reserve(500));

        clock.set_today(day(15));
        assert!(governor.reserve(500));
        let stats = governor.statistics();
        assert_eq!(stats.tokens_used_today, 0);
        assert_eq!(stats.last_reset_date, day(15));
    }

    #[test]
    fn test_rollover_is_idempotent() {
        let (governor, clock) = governor_on(day(14), 500);
        clock.set_today(day(15));
        assert!(governor.rollover_if_new_day());
        governor.commit(10).unwrap();
        assert!(!governor.rollover_if_new_day());
        assert_eq!(governor.statistics().tokens_used_today, 10);
    }

    #[test]
    fn test_counters_survive_rollover() {
        let (governor, clock) = governor_on(day(14), 500);
        governor.commit(10).unwrap();
        governor.record_failure();
        clock.set_today(day(15));
        let stats = governor.statistics();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.failed_requests, 1);
    }

    #[test]
    fn test_manual_reset() {
        let (governor, _) = governor_on(day(14), 500);
        governor.commit(300).unwrap();
        governor.reset();
        assert_eq!(governor.statistics().tokens_used_today, 0);
    }

    #[test]
    fn test_percent_used() {
        let (governor, _) = governor_on(day(14), 400);
        governor.commit(100).unwrap();
        assert!((governor.statistics().percent_used - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_restore_from_earlier_day_zeroes_usage() {
        let mut state = UsageState::new(1000, day(13));
        state.tokens_used_today = 900;
        state.total_requests = 7;
        let clock = Arc::new(ManualClock::new(day(14)));
        let governor = UsageGovernor::restore(state, clock);
        let snapshot = governor.snapshot();
        assert_eq!(snapshot.tokens_used_today, 0);
        assert_eq!(snapshot.last_reset_date, day(14));
        assert_eq!(snapshot.total_requests, 7);
    }

    #[test]
    fn test_restore_same_day_keeps_usage() {
        let mut state = UsageState::new(1000, day(14));
        state.tokens_used_today = 900;
        let clock = Arc::new(ManualClock::new(day(14)));
        let governor = UsageGovernor::restore(state, clock);
        assert_eq!(governor.statistics().tokens_used_today, 900);
        assert!(governor.is_approaching_limit());
    }

    #[test]
    fn test_set_daily_limit_keeps_usage() {
        let (governor, _) = governor_on(day(14), 300);
        governor.commit(200).unwrap();
        governor.set_daily_limit(limit(1000));
        let stats = governor.statistics();
        assert_eq!(stats.tokens_used_today, 200);
        assert_eq!(stats.daily_limit, 1000);
        assert!(governor.reserve(800));
    }

    #[test]
    fn test_concurrent_reserve_overshoots_by_at_most_one_estimate() {
        let estimate = estimate_tokens("two requests racing for the last slot");
        let daily_limit = 1000;
        let (governor, _) = governor_on(day(14), daily_limit);
        governor.commit(daily_limit - estimate).unwrap();
        let governor = Arc::new(governor);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let governor = Arc::clone(&governor);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let reserved = governor.reserve(estimate);
                    // Both reservations happen before either commit.
                    barrier.wait();
                    if reserved {
                        governor.commit(estimate).is_ok()
                    } else {
                        false
                    }
                })
            })
            .collect();

        let accepted: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(accepted.iter().filter(|ok| **ok).count(), 1);

        let used = governor.statistics().tokens_used_today;
        assert!(used > daily_limit);
        assert!(used <= daily_limit + estimate);
    }

    #[test]
    fn test_concurrent_commits_are_not_lost() {
        let (governor, _) = governor_on(day(14), 1_000_000);
        let governor = Arc::new(governor);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let governor = Arc::clone(&governor);
                thread::spawn(move || {
                    for _ in 0..100 {
                        governor.commit(3).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = governor.statistics();
        assert_eq!(stats.tokens_used_today, 2400);
        assert_eq!(stats.total_requests, 800);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_resets_at_midnight() {
        let clock = Arc::new(ManualClock::new(day(14)).with_midnight_in(Duration::from_secs(60)));
        let governor = Arc::new(UsageGovernor::with_clock(limit(500), clock.clone()));
        governor.commit(400).unwrap();

        assert!(governor.start_reset_schedule());
        assert!(governor.is_schedule_running());

        // Before midnight nothing changes.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(governor.snapshot().tokens_used_today, 400);

        clock.set_today(day(15));
        tokio::time::sleep(Duration::from_secs(35)).await;
        let snapshot = governor.snapshot();
        assert_eq!(snapshot.tokens_used_today, 0);
        assert_eq!(snapshot.last_reset_date, day(15));

        // Recurs the following night.
        governor.commit(50).unwrap();
        clock.set_today(day(16));
        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(governor.snapshot().tokens_used_today, 0);

        governor.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_starts_once() {
        let (governor, _) = governor_on(day(14), 500);
        let governor = Arc::new(governor);
        assert!(governor.start_reset_schedule());
        assert!(!governor.start_reset_schedule());
        governor.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_is_idempotent() {
        let (governor, clock) = governor_on(day(14), 500);
        let governor = Arc::new(governor);
        governor.start_reset_schedule();
        governor.commit(100).unwrap();

        governor.shutdown();
        governor.shutdown();
        tokio::task::yield_now().await;
        assert!(!governor.is_schedule_running());

        // A cancelled schedule no longer resets; the lazy check still does.
        clock.set_today(day(15));
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(governor.snapshot().tokens_used_today, 100);
        assert_eq!(governor.statistics().tokens_used_today, 0);
    }

    #[test]
    fn test_shutdown_without_schedule() {
        let (governor, _) = governor_on(day(14), 500);
        governor.shutdown();
        assert!(!governor.is_schedule_running());
    }
}
