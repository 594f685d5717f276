use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};

use crate::error::CoreError;

/// Injected time source. The core never reads the wall clock except
/// through this trait, so tests can substitute a deterministic clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests: pin, set, or advance.
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock").field("now", &self.now()).finish()
    }
}

/// Absolute per-operation deadline supplied by the caller. `none()` means
/// the caller imposes no limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline(Option<DateTime<Utc>>);

impl Deadline {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn at(when: DateTime<Utc>) -> Self {
        Self(Some(when))
    }

    pub fn check(&self, clock: &dyn Clock) -> Result<(), CoreError> {
        match self.0 {
            Some(limit) if clock.now() >= limit => Err(CoreError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

/// Calendar day of `ts` in the learner's UTC offset.
pub fn local_day(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

/// Round a timestamp to the nearest local midnight. Scheduled reviews land
/// on day boundaries so "due today" does not depend on the time of day the
/// previous review happened.
pub fn round_to_day_boundary(ts: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local = ts.with_timezone(&offset);
    let mut date = local.date_naive();
    if local.time().num_seconds_from_midnight() >= 12 * 3600 {
        date = date.succ_opt().unwrap_or(date);
    }
    let local_midnight = date.and_time(NaiveTime::MIN);
    let utc_naive = local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::<Utc>::from_naive_utc_and_offset(utc_naive, Utc)
}
