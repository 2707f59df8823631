use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::Clock;
use crate::UtcDateTime;

/// Minimum spacing between two alerts of the same kind.
pub const ALERT_COOLDOWN: Duration = Duration::from_secs(30 * 60);

/// Thread-safe cooldown gate for rate-limited alerts.
///
/// Each alert kind owns its own gate, so an error-rate alert never blocks an
/// empty-list alert and vice versa.
pub struct CooldownGate {
    cooldown: Duration,
    clock: Arc<dyn Clock>,
    last_fired: Mutex<Option<UtcDateTime>>,
}

impl CooldownGate {
    pub fn new(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cooldown,
            clock,
            last_fired: Mutex::new(None),
        }
    }

    /// True when no alert was granted within the cooldown. Does not stamp.
    pub fn is_open(&self) -> bool {
        let last_fired = self
            .last_fired
            .lock()
            .expect("cooldown gate lock is not poisoned");
        self.elapsed_since(*last_fired)
    }

    /// Grants an alert slot and stamps the gate, or returns false while cooling down.
    pub fn try_acquire(&self) -> bool {
        let mut last_fired = self
            .last_fired
            .lock()
            .expect("cooldown gate lock is not poisoned");
        if !self.elapsed_since(*last_fired) {
            return false;
        }

        *last_fired = Some(self.clock.now());
        true
    }

    /// Stamps the gate regardless of the cooldown.
    pub fn force_acquire(&self) {
        let mut last_fired = self
            .last_fired
            .lock()
            .expect("cooldown gate lock is not poisoned");
        *last_fired = Some(self.clock.now());
    }

    pub fn reset(&self) {
        let mut last_fired = self
            .last_fired
            .lock()
            .expect("cooldown gate lock is not poisoned");
        *last_fired = None;
    }

    pub fn last_fired(&self) -> Option<UtcDateTime> {
        *self
            .last_fired
            .lock()
            .expect("cooldown gate lock is not poisoned")
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn elapsed_since(&self, last_fired: Option<UtcDateTime>) -> bool {
        last_fired
            .map(|fired_at| self.clock.now().duration_since(fired_at) >= self.cooldown)
            .unwrap_or(true)
    }
}

impl std::fmt::Debug for CooldownGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownGate")
            .field("cooldown", &self.cooldown)
            .field("last_fired", &self.last_fired())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn gate_with_clock() -> (CooldownGate, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let gate = CooldownGate::new(ALERT_COOLDOWN, clock.clone());
        (gate, clock)
    }

    #[test]
    fn grants_once_then_cools_down() {
        let (gate, clock) = gate_with_clock();

        assert!(gate.is_open());
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
        assert!(!gate.is_open());

        clock.advance(Duration::from_secs(29 * 60));
        assert!(!gate.try_acquire());

        clock.advance(Duration::from_secs(60));
        assert!(gate.try_acquire());
    }

    #[test]
    fn force_and_reset_bypass_cooldown_state() {
        let (gate, _clock) = gate_with_clock();

        gate.force_acquire();
        assert!(gate.last_fired().is_some());
        assert!(!gate.try_acquire());

        gate.reset();
        assert!(gate.last_fired().is_none());
        assert!(gate.try_acquire());
    }
}
