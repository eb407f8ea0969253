//! Time sources for the marker writer and matcher.
//!
//! The matcher is deterministic given its inputs and a clock; production
//! code uses [`SystemClock`], tests and simulations use [`FixedClock`].

use chrono::{DateTime, Local, NaiveDateTime, Utc};

pub trait Clock: Send + Sync {
    /// The current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;

    /// The current wall-clock time with no timezone attached.
    ///
    /// Used only when a marker timestamp itself carries no timezone; see
    /// the naive-comparison note on [`crate::MarkedForOpFilter`].
    fn now_naive(&self) -> NaiveDateTime;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_naive(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        FixedClock(instant)
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }

    fn now_naive(&self) -> NaiveDateTime {
        self.0.naive_utc()
    }
}
