//! Clock abstraction for logrot.
//!
//! Provides a trait for getting the current time, with both real and mock implementations
//! so age-based retention can be tested against a fixed "now".

use chrono::{DateTime, TimeZone, Utc};

/// Trait for getting the current wall-clock instant.
pub trait Clock: Send + Sync {
    /// Returns the current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for testing with a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct MockClock {
    instant: DateTime<Utc>,
}

impl MockClock {
    /// Create a mock clock fixed at `instant`.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// Create a mock clock from Unix seconds.
    ///
    /// Out-of-range timestamps fall back to the Unix epoch.
    pub fn from_unix_sec(ts: i64) -> Self {
        let instant = Utc
            .timestamp_opt(ts, 0)
            .single()
            .unwrap_or_default();
        Self { instant }
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
