use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Frozen clock; moves only when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<OffsetDateTime>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn fixed_clock_advances_only_on_request() {
        let clock = FixedClock::new(datetime!(2025-01-01 12:00 UTC));
        assert_eq!(clock.now(), datetime!(2025-01-01 12:00 UTC));
        clock.advance(Duration::hours(6));
        assert_eq!(clock.now(), datetime!(2025-01-01 18:00 UTC));
        clock.set(datetime!(2024-12-31 00:00 UTC));
        assert_eq!(clock.now(), datetime!(2024-12-31 00:00 UTC));
    }
}
