//! Common ECS components

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Transform component for agent pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
}

impl Transform {
    /// Create a new transform at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with a position and a yaw (radians around +Y)
    pub fn from_position_yaw(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw),
        }
    }

    /// Get the forward direction (negative Z in local space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the up direction (positive Y in local space)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Transform a point from local space into world space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Current heading around +Y, zero when facing -Z
    pub fn yaw(&self) -> f32 {
        let forward = self.forward();
        (-forward.x).atan2(-forward.z)
    }

    /// Turn to face a horizontal direction, rotating at most `max_radians`.
    ///
    /// Vertical components of `direction` are ignored; a zero direction is a no-op.
    pub fn turn_towards(&mut self, direction: Vec3, max_radians: f32) {
        let flat = Vec3::new(direction.x, 0.0, direction.z);
        if flat.length_squared() <= f32::EPSILON {
            return;
        }

        let desired = (-flat.x).atan2(-flat.z);
        let current = self.yaw();
        let mut delta = desired - current;
        while delta > std::f32::consts::PI {
            delta -= std::f32::consts::TAU;
        }
        while delta < -std::f32::consts::PI {
            delta += std::f32::consts::TAU;
        }

        let step = delta.clamp(-max_radians.abs(), max_radians.abs());
        self.rotation = Quat::from_rotation_y(current + step);
    }

    /// Face a horizontal direction immediately
    pub fn face(&mut self, direction: Vec3) {
        self.turn_towards(direction, std::f32::consts::TAU);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Presentation flag pushed once per tick for the animation layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Locomotion {
    pub moving: bool,
}

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_forward_is_negative_z() {
        let transform = Transform::new();
        assert!((transform.forward() - Vec3::NEG_Z).length() < 1e-5);
        assert!(transform.yaw().abs() < 1e-5);
    }

    #[test]
    fn test_face_direction() {
        let mut transform = Transform::new();
        transform.face(Vec3::new(1.0, 5.0, 0.0));

        assert!((transform.forward() - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_turn_towards_is_rate_limited() {
        let mut transform = Transform::new();
        transform.turn_towards(Vec3::Z, 0.5);

        // Facing backwards needs PI radians, only 0.5 allowed
        assert!((transform.yaw().abs() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_transform_point_uses_rotation() {
        let transform = Transform::from_position_yaw(Vec3::new(1.0, 0.0, 0.0), std::f32::consts::FRAC_PI_2);
        let eye = transform.transform_point(Vec3::new(0.0, 1.5, -1.0));

        // Rotated a quarter turn left: local -Z points to world -X
        assert!((eye - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-4);
    }
}
