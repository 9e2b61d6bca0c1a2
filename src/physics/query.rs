//! Obstruction ray queries
//!
//! The AI layer never talks to a physics engine directly; it asks an
//! [`ObstructionQuery`] for the first hit along a ray.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Stable identifier of a physical body, independent of the physics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u64);

/// Result of a raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The body that was hit, if the collider belongs to a known body
    pub body: Option<BodyId>,
    /// The point of intersection
    pub point: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}

/// Ray query service used by perception and ground casts
pub trait ObstructionQuery {
    /// Cast a ray and return the first hit on any layer in `mask`.
    ///
    /// `direction` does not need to be normalized; `max_distance` is measured
    /// in world units along the normalized direction.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32)
    -> Option<RaycastHit>;
}

/// A world with nothing in it
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySpace;

impl ObstructionQuery for EmptySpace {
    fn raycast(&self, _: Vec3, _: Vec3, _: f32, _: u32) -> Option<RaycastHit> {
        None
    }
}
