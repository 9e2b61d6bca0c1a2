//! Locomotion input and scripted input playback
//!
//! The headless demo has no keyboard, so the player is driven by a recorded
//! script of timed input steps that loops once it runs out.
//!
//! # Example
//!
//! ```ignore
//! let script = InputScript::new(vec![
//!     InputStep::walk(2.0, Vec2::Y),
//!     InputStep::jump(0.1),
//! ]);
//! let input = script.sample(time.elapsed_seconds());
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One tick of player intent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionInput {
    /// Planar stick: `x` strafes right, `y` moves forward
    pub movement: Vec2,
    /// Jump pressed
    pub jump: bool,
}

/// Input held for a stretch of time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputStep {
    /// Seconds the input is held
    pub duration: f32,
    /// Input held
    #[serde(default)]
    pub input: LocomotionInput,
    /// Camera yaw in radians while held
    #[serde(default)]
    pub camera_yaw: f32,
}

impl InputStep {
    /// Walk with `movement` for `duration` seconds
    #[must_use]
    pub fn walk(duration: f32, movement: Vec2) -> Self {
        Self {
            duration,
            input: LocomotionInput {
                movement,
                jump: false,
            },
            camera_yaw: 0.0,
        }
    }

    /// Hold jump for `duration` seconds
    #[must_use]
    pub fn jump(duration: f32) -> Self {
        Self {
            duration,
            input: LocomotionInput {
                movement: Vec2::ZERO,
                jump: true,
            },
            camera_yaw: 0.0,
        }
    }

    /// Turn the camera for this step
    #[must_use]
    pub fn with_camera_yaw(mut self, yaw: f32) -> Self {
        self.camera_yaw = yaw;
        self
    }
}

/// A looping sequence of input steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputScript {
    steps: Vec<InputStep>,
}

impl InputScript {
    /// Create a script from steps
    #[must_use]
    pub fn new(steps: Vec<InputStep>) -> Self {
        Self { steps }
    }

    /// Total length of one loop
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.steps.iter().map(|s| s.duration.max(0.0)).sum()
    }

    /// No steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps in playback order
    #[must_use]
    pub fn steps(&self) -> &[InputStep] {
        &self.steps
    }

    /// Input and camera yaw at `elapsed` seconds
    #[must_use]
    pub fn sample(&self, elapsed: f64) -> (LocomotionInput, f32) {
        let total = f64::from(self.duration());
        if total <= 0.0 {
            return (LocomotionInput::default(), 0.0);
        }

        let mut t = elapsed.rem_euclid(total);
        for step in &self.steps {
            let duration = f64::from(step.duration.max(0.0));
            if t < duration {
                return (step.input, step.camera_yaw);
            }
            t -= duration;
        }
        self.steps
            .last()
            .map_or((LocomotionInput::default(), 0.0), |s| (s.input, s.camera_yaw))
    }
}
