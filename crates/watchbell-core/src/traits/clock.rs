//! Wall-clock abstraction so bucket rollover can be tested without real time.

use chrono::NaiveDateTime;

/// Provides the current local time. Buckets are calendar days in local time,
/// matching how the folders are named.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The real local clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
