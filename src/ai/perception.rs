//! Line-of-sight and field-of-view checks

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ecs::Transform;
use crate::physics::{BodyId, ObstructionQuery, layers};

/// Field of view at or above which no angle check is made
pub const FULL_VIEW_DEGREES: f32 = 180.0;

/// What an agent pursues: a read-only snapshot taken once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    /// World position
    pub position: Vec3,
    /// Physics body, so a ray hitting the target counts as seeing it
    pub body: Option<BodyId>,
}

impl Target {
    /// A target with no physics body
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            body: None,
        }
    }

    /// Attach the target's physics body
    #[must_use]
    pub fn with_body(mut self, body: BodyId) -> Self {
        self.body = Some(body);
        self
    }
}

/// Sight settings for one observer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Perception {
    /// Maximum sight distance
    pub detection_radius: f32,
    /// Full view angle in degrees; 180 or more disables the angle check
    pub fov_degrees: f32,
    /// Eye height above the agent's position when no eye offset is set
    pub eye_height: f32,
    /// Eye position in the agent's local space
    pub eye_offset: Option<Vec3>,
    /// Collision groups that block sight
    pub obstruction_mask: u32,
}

impl Default for Perception {
    fn default() -> Self {
        Self {
            detection_radius: 15.0,
            fov_degrees: 120.0,
            eye_height: 1.6,
            eye_offset: None,
            obstruction_mask: layers::SIGHT_OBSTRUCTION,
        }
    }
}

impl Perception {
    /// World-space eye point of `observer`
    #[must_use]
    pub fn eye(&self, observer: &Transform) -> Vec3 {
        match self.eye_offset {
            Some(offset) => observer.transform_point(offset),
            None => observer.position + observer.up() * self.eye_height,
        }
    }

    /// Target inside the view cone, ignoring distance and obstructions
    #[must_use]
    pub fn in_field_of_view(&self, observer: &Transform, to_target: Vec3) -> bool {
        if self.fov_degrees >= FULL_VIEW_DEGREES {
            return true;
        }
        let angle = observer.forward().angle_between(to_target).to_degrees();
        angle <= self.fov_degrees * 0.5
    }

    /// The observer can see the target.
    ///
    /// Range is checked first, then the view cone, then a single ray from the
    /// eye. The ray may hit the target's own body; anything else in the way
    /// blocks sight.
    #[must_use]
    pub fn has_line_of_sight(
        &self,
        observer: &Transform,
        target: &Target,
        query: &dyn ObstructionQuery,
    ) -> bool {
        let eye = self.eye(observer);
        let to_target = target.position - eye;
        let distance = to_target.length();

        if distance <= f32::EPSILON {
            return true;
        }
        if distance > self.detection_radius {
            return false;
        }
        if !self.in_field_of_view(observer, to_target) {
            return false;
        }

        match query.raycast(eye, to_target / distance, distance, self.obstruction_mask) {
            None => true,
            Some(hit) => target.body.is_some() && hit.body == target.body,
        }
    }
}
