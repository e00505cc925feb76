//! Local-date source for the usage governor.

use std::time::Duration;

use chrono::{DateTime, Days, Local, NaiveDate, TimeZone};

/// Source of "today" and "time until tomorrow" in the process-local zone.
pub trait Clock: Send + Sync + 'static {
    fn today(&self) -> NaiveDate;

    /// Wall-clock time remaining until the next local midnight.
    fn until_next_midnight(&self) -> Duration;
}

/// Clock backed by `chrono::Local`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn until_next_midnight(&self) -> Duration {
        until_next_midnight(Local::now())
    }
}

/// Time from `now` until the start of the next calendar day in `now`'s zone.
///
/// If midnight does not exist locally (a DST gap), the earliest valid instant
/// after it is used. Never returns zero.
pub fn until_next_midnight<Tz: TimeZone>(now: DateTime<Tz>) -> Duration {
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|date| date.and_hms_opt(0, 0, 0));

    let Some(naive_midnight) = tomorrow else {
        return Duration::from_secs(24 * 60 * 60);
    };

    let tz = now.timezone();
    let midnight = tz.from_local_datetime(&naive_midnight).earliest().or_else(|| {
        tz.from_local_datetime(&(naive_midnight + chrono::Duration::hours(1)))
            .earliest()
    });

    match midnight {
        Some(midnight) => (midnight - now)
            .to_std()
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_secs(1)),
        None => Duration::from_secs(24 * 60 * 60),
    }
}

#[cfg(test)]
pub(crate) mod manual {
    use std::sync::{Mutex, PoisonError};

    use super::*;

    /// Test clock whose date only changes when told to.
    pub(crate) struct ManualClock {
        today: Mutex<NaiveDate>,
        until_midnight: Duration,
    }

    impl ManualClock {
        pub(crate) fn new(today: NaiveDate) -> Self {
            Self {
                today: Mutex::new(today),
                until_midnight: Duration::from_secs(60),
            }
        }

        pub(crate) fn with_midnight_in(mut self, delay: Duration) -> Self {
            self.until_midnight = delay;
            self
        }

        pub(crate) fn set_today(&self, date: NaiveDate) {
            *self.today.lock().unwrap_or_else(PoisonError::into_inner) = date;
        }
    }

    impl Clock for ManualClock {
        fn today(&self) -> NaiveDate {
            *self.today.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn until_next_midnight(&self) -> Duration {
            self.until_midnight
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_until_next_midnight_mid_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 18, 30, 0).unwrap();
        assert_eq!(
            until_next_midnight(now),
            Duration::from_secs(5 * 3600 + 30 * 60)
        );
    }

    #[test]
    fn test_until_next_midnight_just_after_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 1).unwrap();
        assert_eq!(until_next_midnight(now), Duration::from_secs(86_399));
    }

    #[test]
    fn test_until_next_midnight_crosses_year() {
        let now = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 0).unwrap();
        assert_eq!(until_next_midnight(now), Duration::from_secs(60));
    }

    #[test]
    fn test_system_clock_is_positive() {
        let d = SystemClock.until_next_midnight();
        assert!(!d.is_zero());
        assert!(d <= Duration::from_secs(25 * 3600));
    }
}
