//! Time sources for every time-windowed component.

use std::sync::Mutex;
use std::time::Duration;

use crate::UtcDateTime;

/// Source of "now" for windowing, cache expiry, and alert cooldowns.
pub trait Clock: Send + Sync {
    fn now(&self) -> UtcDateTime;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UtcDateTime {
        UtcDateTime::now()
    }
}

/// Manually driven clock for simulations and tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<UtcDateTime>,
}

impl ManualClock {
    pub fn new(start: UtcDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Starts at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(UtcDateTime::now())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("manual clock lock is not poisoned");
        *now = now.plus(by);
    }

    pub fn set(&self, to: UtcDateTime) {
        let mut now = self.now.lock().expect("manual clock lock is not poisoned");
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UtcDateTime {
        *self.now.lock().expect("manual clock lock is not poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_only_when_told() {
        let start = UtcDateTime::parse("2024-04-01T09:00:00Z").expect("valid timestamp");
        let clock = ManualClock::new(start);

        assert_eq!(clock.now(), start);
        clock.advance(Duration::from_secs(600));
        assert_eq!(clock.now().duration_since(start), Duration::from_secs(600));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
