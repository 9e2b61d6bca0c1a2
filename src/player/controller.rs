//! Camera-relative character movement with jumping and gravity

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::input::LocomotionInput;
use crate::ecs::Transform;
use crate::physics::{ObstructionQuery, layers};

/// Height above the feet where the ground cast starts
const CAST_START: f32 = 0.5;

/// Player movement tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Planar speed in units per second
    pub move_speed: f32,
    /// Jump apex height
    pub jump_height: f32,
    /// Vertical acceleration, negative is down
    pub gravity: f32,
    /// How far below the feet ground is still snapped to
    pub ground_snap: f32,
    /// Turn rate in degrees per second
    pub turn_speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            jump_height: 1.2,
            gravity: -9.81,
            ground_snap: 0.2,
            turn_speed: 720.0,
        }
    }
}

/// Moves the player from input
#[derive(Debug, Clone)]
pub struct PlayerController {
    config: PlayerConfig,
    vertical_speed: f32,
    grounded: bool,
}

impl PlayerController {
    /// Create a controller
    #[must_use]
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            vertical_speed: 0.0,
            grounded: false,
        }
    }

    /// Standing on ground after the last update
    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Current vertical speed
    #[must_use]
    pub fn vertical_speed(&self) -> f32 {
        self.vertical_speed
    }

    /// Initial upward speed that reaches `jump_height`
    #[must_use]
    pub fn jump_speed(&self) -> f32 {
        (2.0 * self.config.gravity.abs() * self.config.jump_height.max(0.0)).sqrt()
    }

    /// Apply one tick of input. Returns true if the player moved horizontally.
    pub fn update(
        &mut self,
        transform: &mut Transform,
        input: LocomotionInput,
        camera_yaw: f32,
        ground: &dyn ObstructionQuery,
        dt: f32,
    ) -> bool {
        let (sin, cos) = camera_yaw.sin_cos();
        let forward = Vec3::new(-sin, 0.0, -cos);
        let right = Vec3::new(cos, 0.0, -sin);
        let stick = input.movement.clamp_length_max(1.0);
        let planar = (right * stick.x + forward * stick.y) * self.config.move_speed;

        if self.grounded && input.jump {
            self.vertical_speed = self.jump_speed();
            self.grounded = false;
        }
        self.vertical_speed += self.config.gravity * dt;

        transform.position += (planar + Vec3::Y * self.vertical_speed) * dt;
        self.snap_to_ground(transform, ground);

        let moving = planar.length_squared() > f32::EPSILON;
        if moving {
            transform.turn_towards(planar, self.config.turn_speed.to_radians() * dt);
        }
        moving
    }

    fn snap_to_ground(&mut self, transform: &mut Transform, ground: &dyn ObstructionQuery) {
        if self.vertical_speed > 0.0 {
            self.grounded = false;
            return;
        }

        let origin = transform.position + Vec3::Y * CAST_START;
        let reach = CAST_START + self.config.ground_snap;
        match ground.raycast(origin, Vec3::NEG_Y, reach, layers::GROUND) {
            Some(hit) => {
                transform.position.y = hit.point.y;
                self.vertical_speed = 0.0;
                self.grounded = true;
            }
            None => self.grounded = false,
        }
    }
}
