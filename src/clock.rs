use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Source of the current time for every service and the cart sweeper.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.guard() = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.guard() += by;
    }

    fn guard(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.guard()
    }
}

/// Time of day at the business location for `now`.
pub fn local_time_of_day(now: DateTime<Utc>, offset: FixedOffset) -> NaiveTime {
    now.with_timezone(&offset).time()
}
