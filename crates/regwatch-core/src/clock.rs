//! Policy clock: turns "now" into the run's reference date.
//!
//! Due dates are unit-local business days, so the reference date is taken in
//! a fixed regional offset rather than UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant. Used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Calendar date of `instant` in the given UTC offset (minutes east).
/// Out-of-range offsets fall back to UTC.
pub fn reference_date(instant: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    match FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)) {
        Some(offset) => instant.with_timezone(&offset).date_naive(),
        None => {
            tracing::warn!("Invalid UTC offset {utc_offset_minutes}min, using UTC for reference date");
            instant.date_naive()
        }
    }
}
