//! Navigation service interface
//!
//! Pathfinding, steering and link geometry belong to the host navigation
//! system. Controllers only set parameters on a [`NavAgent`] and react to what
//! it reports: pending paths, remaining distance, path status and links.

pub mod sandbox;

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use sandbox::{NavMesh, NavSurface, SandboxAgent};

/// Status of the agent's current path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathStatus {
    /// The path reaches the destination
    #[default]
    Complete,
    /// The path ends somewhere short of the destination
    Partial,
    /// No path could be computed
    Invalid,
}

impl PathStatus {
    /// A partial or invalid path; the goal cannot be reached as requested
    #[must_use]
    pub fn is_blocked(self) -> bool {
        matches!(self, Self::Partial | Self::Invalid)
    }
}

/// A traversable connection between two otherwise disconnected walkable regions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkData {
    /// Where the crossing begins
    pub start: Vec3,
    /// Where the crossing ends
    pub end: Vec3,
}

impl LinkData {
    /// Create a link between two anchors
    #[must_use]
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// The same link crossed the other way
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }

    /// Straight-line length of the crossing
    #[must_use]
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// Movement tuning handed to the navigation service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementProfile {
    /// Top speed in units per second
    pub speed: f32,
    /// Maximum acceleration in units per second squared
    pub acceleration: f32,
    /// Maximum turn rate in degrees per second
    pub angular_speed: f32,
    /// Distance from the goal at which the service stops steering
    pub stopping_distance: f32,
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self {
            speed: 3.5,
            acceleration: 8.0,
            angular_speed: 120.0,
            stopping_distance: 0.0,
        }
    }
}

/// The per-agent handle into the host navigation service.
pub trait NavAgent {
    /// Request a path to `point`. Returns false if the request was refused.
    fn set_destination(&mut self, point: Vec3) -> bool;

    /// Drop the current path.
    fn reset_path(&mut self);

    /// A path request is still being computed.
    fn has_pending_path(&self) -> bool;

    /// Distance left along the current path.
    fn remaining_distance(&self) -> f32;

    /// Status of the current path.
    fn path_status(&self) -> PathStatus;

    /// The agent is standing at (or on) a link and waits for someone to cross it.
    fn is_on_link(&self) -> bool;

    /// Endpoints of the link the agent is on, oriented in crossing direction.
    fn current_link(&self) -> Option<LinkData>;

    /// Tell the service the scripted link crossing is done.
    fn complete_link_traversal(&mut self);

    /// Nearest walkable point within `max_radius` of `near`.
    fn sample_point(&self, near: Vec3, max_radius: f32) -> Option<Vec3>;

    /// Whether the service writes the agent's position while moving.
    fn set_update_position(&mut self, enabled: bool);

    /// Halt or resume movement along the path.
    fn set_stopped(&mut self, stopped: bool);

    /// Movement is halted.
    fn is_stopped(&self) -> bool;

    /// The agent stands on a navigable surface.
    fn is_on_navmesh(&self) -> bool;

    /// Change top speed.
    fn set_speed(&mut self, speed: f32);

    /// Apply a full movement profile.
    fn apply_profile(&mut self, profile: &MovementProfile);

    /// Current velocity.
    fn velocity(&self) -> Vec3;
}

/// Request a path unless the agent is off the navigable surface.
///
/// Off-mesh requests are skipped silently; the caller retries on its next
/// cadence or cooldown.
pub fn request_path<N: NavAgent + ?Sized>(nav: &mut N, point: Vec3) -> bool {
    if !nav.is_on_navmesh() {
        log::trace!("skipping path request to {point}: agent is off the navmesh");
        return false;
    }
    nav.set_destination(point)
}

/// Snap a point to walkable ground, falling back to the raw point.
pub fn snap_to_walkable<N: NavAgent + ?Sized>(nav: &N, point: Vec3, max_radius: f32) -> Vec3 {
    nav.sample_point(point, max_radius).unwrap_or_else(|| {
        log::trace!("no walkable point within {max_radius} of {point}, using raw point");
        point
    })
}

/// Scripted navigation fake for controller tests.
#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    /// Records every call and reports whatever the test sets.
    #[derive(Debug, Default)]
    pub struct FakeNav {
        pub destinations: Vec<Vec3>,
        pub resets: usize,
        pub pending: bool,
        pub remaining: f32,
        pub status: PathStatus,
        pub link: Option<LinkData>,
        pub link_completions: usize,
        pub walkable: Option<Vec3>,
        pub update_position: bool,
        pub stopped: bool,
        pub off_mesh: bool,
        pub speed: f32,
    }

    impl FakeNav {
        pub fn new() -> Self {
            Self {
                update_position: true,
                remaining: f32::INFINITY,
                ..Default::default()
            }
        }

        pub fn last_destination(&self) -> Option<Vec3> {
            self.destinations.last().copied()
        }
    }

    impl NavAgent for FakeNav {
        fn set_destination(&mut self, point: Vec3) -> bool {
            self.destinations.push(point);
            true
        }

        fn reset_path(&mut self) {
            self.resets += 1;
        }

        fn has_pending_path(&self) -> bool {
            self.pending
        }

        fn remaining_distance(&self) -> f32 {
            self.remaining
        }

        fn path_status(&self) -> PathStatus {
            self.status
        }

        fn is_on_link(&self) -> bool {
            self.link.is_some()
        }

        fn current_link(&self) -> Option<LinkData> {
            self.link
        }

        fn complete_link_traversal(&mut self) {
            self.link = None;
            self.link_completions += 1;
        }

        fn sample_point(&self, _near: Vec3, _max_radius: f32) -> Option<Vec3> {
            self.walkable
        }

        fn set_update_position(&mut self, enabled: bool) {
            self.update_position = enabled;
        }

        fn set_stopped(&mut self, stopped: bool) {
            self.stopped = stopped;
        }

        fn is_stopped(&self) -> bool {
            self.stopped
        }

        fn is_on_navmesh(&self) -> bool {
            !self.off_mesh
        }

        fn set_speed(&mut self, speed: f32) {
            self.speed = speed;
        }

        fn apply_profile(&mut self, profile: &MovementProfile) {
            self.speed = profile.speed;
        }

        fn velocity(&self) -> Vec3 {
            Vec3::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeNav;
    use super::*;

    #[test]
    fn test_request_path_skips_off_mesh() {
        let mut nav = FakeNav::new();
        nav.off_mesh = true;

        assert!(!request_path(&mut nav, Vec3::X));
        assert!(nav.destinations.is_empty());

        nav.off_mesh = false;
        assert!(request_path(&mut nav, Vec3::X));
        assert_eq!(nav.last_destination(), Some(Vec3::X));
    }

    #[test]
    fn test_snap_falls_back_to_raw_point() {
        let mut nav = FakeNav::new();
        let raw = Vec3::new(3.0, 7.0, 1.0);
        assert_eq!(snap_to_walkable(&nav, raw, 1.0), raw);

        nav.walkable = Some(Vec3::new(3.0, 5.0, 1.0));
        assert_eq!(snap_to_walkable(&nav, raw, 1.0), Vec3::new(3.0, 5.0, 1.0));
    }

    #[test]
    fn test_path_status_blocked() {
        assert!(!PathStatus::Complete.is_blocked());
        assert!(PathStatus::Partial.is_blocked());
        assert!(PathStatus::Invalid.is_blocked());
    }

    #[test]
    fn test_link_reversed() {
        let link = LinkData::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0));
        let back = link.reversed();

        assert_eq!(back.start, link.end);
        assert!((link.length() - 5.0).abs() < 1e-6);
    }
}
