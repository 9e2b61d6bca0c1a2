//! Cooperative timers driven by the agent tick
//!
//! Waits and throttles are explicit state advanced once per tick rather than
//! suspended code. Dropping a task cancels it.

use serde::{Deserialize, Serialize};

// ============================================================================
// Countdown
// ============================================================================

/// A timer that counts down to zero and stays expired until reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    duration: f32,
    remaining: f32,
}

impl Countdown {
    /// Create a countdown starting full
    #[must_use]
    pub fn new(duration: f32) -> Self {
        let duration = duration.max(0.0);
        Self {
            duration,
            remaining: duration,
        }
    }

    /// Refill to the full duration
    pub fn reset(&mut self) {
        self.remaining = self.duration;
    }

    /// Count down by `dt`. Returns true once the countdown has run out.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining = (self.remaining - dt).max(0.0);
        self.is_expired()
    }

    /// The countdown reached zero
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Seconds left
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Full duration
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }
}

// ============================================================================
// Cooldown
// ============================================================================

/// Throttle keyed on simulation time.
///
/// Records when the guarded action last happened; ready again once
/// `duration` seconds have passed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    duration: f64,
    last: Option<f64>,
}

impl Cooldown {
    /// Create a cooldown that is immediately ready
    #[must_use]
    pub fn new(duration: f32) -> Self {
        Self {
            duration: f64::from(duration.max(0.0)),
            last: None,
        }
    }

    /// Record that the action happened at `now`
    pub fn mark(&mut self, now: f64) {
        self.last = Some(now);
    }

    /// Enough time passed since the last mark
    #[must_use]
    pub fn is_ready(&self, now: f64) -> bool {
        self.last.is_none_or(|last| now - last >= self.duration)
    }

    /// Time of the last mark
    #[must_use]
    pub fn last(&self) -> Option<f64> {
        self.last
    }
}

// ============================================================================
// Cadence
// ============================================================================

/// Fires at a fixed interval. The first tick after creation or
/// [`Cadence::trigger`] fires immediately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    interval: f32,
    elapsed: f32,
    /// Fire on the next tick regardless of elapsed time
    primed: bool,
}

impl Cadence {
    /// Create a cadence that fires on its first tick
    #[must_use]
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(0.0),
            elapsed: 0.0,
            primed: true,
        }
    }

    /// Make the next tick fire
    pub fn trigger(&mut self) {
        self.primed = true;
    }

    /// Restart the interval without firing
    pub fn restart(&mut self) {
        self.primed = false;
        self.elapsed = 0.0;
    }

    /// Advance by `dt`; true when the interval elapsed.
    ///
    /// Time past the interval carries into the next one, capped at one
    /// interval so a long frame fires once rather than queueing firings.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.primed {
            self.primed = false;
            self.elapsed = 0.0;
            return true;
        }
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = (self.elapsed - self.interval).min(self.interval);
            return true;
        }
        false
    }

    /// Seconds between firings
    #[must_use]
    pub fn interval(&self) -> f32 {
        self.interval
    }
}

// ============================================================================
// Dwell
// ============================================================================

/// Single-shot wait that completes exactly once.
///
/// Owners hold it in an `Option`; taking it out cancels the wait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dwell {
    remaining: f32,
    finished: bool,
}

impl Dwell {
    /// Start a wait of `duration` seconds
    #[must_use]
    pub fn new(duration: f32) -> Self {
        Self {
            remaining: duration.max(0.0),
            finished: false,
        }
    }

    /// Advance the wait. Returns true on the one tick it completes.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.finished {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.finished = true;
            return true;
        }
        false
    }

    /// The wait has completed
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_expires_after_three_ticks() {
        let mut countdown = Countdown::new(3.0);

        assert!(!countdown.tick(1.0));
        assert!(!countdown.tick(1.0));
        assert!(countdown.tick(1.0));
        assert!(countdown.is_expired());

        countdown.reset();
        assert!((countdown.remaining() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_cooldown_gates_on_sim_time() {
        let mut cooldown = Cooldown::new(1.0);
        assert!(cooldown.is_ready(0.0));

        cooldown.mark(2.0);
        assert!(!cooldown.is_ready(2.5));
        assert!(cooldown.is_ready(3.0));
        assert_eq!(cooldown.last(), Some(2.0));
    }

    #[test]
    fn test_cadence_fires_first_then_on_interval() {
        let mut cadence = Cadence::new(0.25);

        let fired: Vec<bool> = (0..5).map(|_| cadence.tick(0.1)).collect();
        assert_eq!(fired, vec![true, false, false, true, false]);
    }

    #[test]
    fn test_cadence_keeps_pace_with_long_ticks() {
        let mut cadence = Cadence::new(0.5);

        // Every tick covers a full interval
        assert!((0..6).all(|_| cadence.tick(1.0)));
    }

    #[test]
    fn test_cadence_carries_remainder() {
        let mut cadence = Cadence::new(1.0);
        assert!(cadence.tick(0.0));

        assert!(!cadence.tick(0.75));
        assert!(cadence.tick(0.75));
        // 0.5 carried over
        assert!(cadence.tick(0.5));
        assert!(!cadence.tick(0.5));
    }

    #[test]
    fn test_cadence_trigger_and_restart() {
        let mut cadence = Cadence::new(1.0);
        assert!(cadence.tick(0.1));
        assert!(!cadence.tick(0.1));

        cadence.trigger();
        assert!(cadence.tick(0.1));

        cadence.restart();
        assert!(!cadence.tick(0.1));
    }

    #[test]
    fn test_dwell_completes_once() {
        let mut dwell = Dwell::new(0.5);

        assert!(!dwell.tick(0.25));
        assert!(dwell.tick(0.25));
        assert!(dwell.is_finished());
        assert!(!dwell.tick(0.25));
    }
}
