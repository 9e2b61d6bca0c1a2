//! Fixed-step simulation clock

use std::time::Duration;

/// Simulation time advanced in fixed ticks.
///
/// The AI never reads the wall clock: cooldowns and countdowns are measured
/// against [`Time::elapsed_seconds`], which makes runs reproducible.
#[derive(Debug, Clone)]
pub struct Time {
    /// Length of one tick
    step: Duration,
    /// Simulated seconds since start
    elapsed: f64,
    /// Ticks completed
    ticks: u64,
}

impl Time {
    /// Create a clock ticking at `tick_rate` Hz
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self::with_step(Duration::from_secs_f64(1.0 / f64::from(tick_rate.max(1))))
    }

    /// Create a clock with an explicit step
    #[must_use]
    pub fn with_step(step: Duration) -> Self {
        Self {
            step,
            elapsed: 0.0,
            ticks: 0,
        }
    }

    /// Advance by one tick
    pub fn advance(&mut self) {
        self.elapsed += self.step.as_secs_f64();
        self.ticks += 1;
    }

    /// Delta time of one tick in seconds
    #[must_use]
    pub fn delta_seconds(&self) -> f32 {
        self.step.as_secs_f32()
    }

    /// Delta time of one tick
    #[must_use]
    pub fn delta(&self) -> Duration {
        self.step
    }

    /// Simulated seconds since start
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed
    }

    /// Number of ticks completed
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new(60)
    }
}
