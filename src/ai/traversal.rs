//! Scripted link crossing on a parabolic arc
//!
//! While a crossing runs, the navigation service's own position updates are
//! switched off and the agent is moved here. When it ends the agent sits
//! exactly on the link end and the service gets position authority back.

use glam::Vec3;

use crate::ecs::Transform;
use crate::navigation::{LinkData, NavAgent};

/// Smallest speed used when timing a crossing
const MIN_SPEED: f32 = 1e-4;

/// Time to cross `distance` at `speed`
#[must_use]
pub fn duration_for(distance: f32, speed: f32) -> f32 {
    distance / speed.max(MIN_SPEED)
}

/// Height added above the straight line at progress `f` in `[0, 1]`.
///
/// Zero at both ends, `height` at the midpoint.
#[must_use]
pub fn arc_offset(height: f32, f: f32) -> f32 {
    let f = f.clamp(0.0, 1.0);
    height * 4.0 * f * (1.0 - f)
}

/// Position along the arc at progress `f`
#[must_use]
pub fn sample(link: &LinkData, height: f32, f: f32) -> Vec3 {
    let f = f.clamp(0.0, 1.0);
    link.start.lerp(link.end, f) + Vec3::Y * arc_offset(height, f)
}

/// Result of advancing a crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalStatus {
    /// Nothing running
    Idle,
    /// Still crossing
    Running,
    /// Finished this tick
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Crossing {
    link: LinkData,
    height: f32,
    duration: f32,
    elapsed: f32,
}

/// Single-flight link crossing for one agent
#[derive(Debug, Clone, Default)]
pub struct LinkTraversal {
    active: Option<Crossing>,
}

impl LinkTraversal {
    /// Create an idle controller
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A crossing is in progress
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The link being crossed
    #[must_use]
    pub fn link(&self) -> Option<LinkData> {
        self.active.map(|c| c.link)
    }

    /// Start crossing `link`. Returns false if a crossing is already running.
    pub fn begin<N: NavAgent + ?Sized>(
        &mut self,
        link: LinkData,
        speed: f32,
        arc_height: f32,
        nav: &mut N,
    ) -> bool {
        if self.active.is_some() {
            return false;
        }

        nav.set_update_position(false);
        self.active = Some(Crossing {
            link,
            height: arc_height,
            duration: duration_for(link.length(), speed),
            elapsed: 0.0,
        });
        log::debug!("crossing link {} -> {}", link.start, link.end);
        true
    }

    /// Move the agent along the arc by `dt`
    pub fn advance<N: NavAgent + ?Sized>(
        &mut self,
        dt: f32,
        transform: &mut Transform,
        nav: &mut N,
    ) -> TraversalStatus {
        let Some(crossing) = self.active.as_mut() else {
            return TraversalStatus::Idle;
        };

        crossing.elapsed += dt;
        let link = crossing.link;
        transform.face(link.end - link.start);

        if crossing.duration <= 0.0 || crossing.elapsed >= crossing.duration {
            self.active = None;
            transform.position = link.end;
            nav.complete_link_traversal();
            nav.set_update_position(true);
            log::debug!("landed at {}", link.end);
            return TraversalStatus::Completed;
        }

        let f = crossing.elapsed / crossing.duration;
        transform.position = sample(&link, crossing.height, f);
        TraversalStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::fake::FakeNav;

    fn ramp() -> LinkData {
        LinkData::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0))
    }

    #[test]
    fn test_duration() {
        assert!((duration_for(ramp().length(), 2.0) - 5.0).abs() < 1e-6);
        assert!(duration_for(1.0, 0.0).is_finite());
    }

    #[test]
    fn test_arc_peaks_at_midpoint() {
        let height = 1.5;
        assert!((arc_offset(height, 0.5) - height).abs() < 1e-6);
        assert_eq!(arc_offset(height, 0.0), 0.0);
        assert_eq!(arc_offset(height, 1.0), 0.0);

        let mid = sample(&ramp(), height, 0.5);
        assert!((mid - Vec3::new(0.0, height, 5.0)).length() < 1e-5);
    }

    #[test]
    fn test_crossing_runs_to_completion() {
        let mut nav = FakeNav::new();
        nav.link = Some(ramp());
        let mut transform = Transform::from_position(Vec3::ZERO);
        let mut traversal = LinkTraversal::new();

        assert!(traversal.begin(ramp(), 2.0, 1.0, &mut nav));
        assert!(!nav.update_position);

        // t = 2.5 of 5.0
        for _ in 0..5 {
            assert_eq!(traversal.advance(0.5, &mut transform, &mut nav), TraversalStatus::Running);
        }
        assert!((transform.position.y - 1.0).abs() < 1e-5);
        assert!((transform.position.z - 5.0).abs() < 1e-5);

        let mut status = TraversalStatus::Running;
        for _ in 0..5 {
            status = traversal.advance(0.5, &mut transform, &mut nav);
        }
        assert_eq!(status, TraversalStatus::Completed);
        assert_eq!(transform.position, ramp().end);
        assert_eq!(nav.link_completions, 1);
        assert!(nav.update_position);
        assert!(!traversal.is_active());
        assert_eq!(traversal.advance(0.5, &mut transform, &mut nav), TraversalStatus::Idle);
    }

    #[test]
    fn test_reentry_is_suppressed() {
        let mut nav = FakeNav::new();
        let mut traversal = LinkTraversal::new();

        assert!(traversal.begin(ramp(), 2.0, 1.0, &mut nav));
        assert!(!traversal.begin(ramp().reversed(), 2.0, 1.0, &mut nav));
        assert_eq!(traversal.link(), Some(ramp()));
    }

    #[test]
    fn test_faces_along_link() {
        let mut nav = FakeNav::new();
        let mut transform = Transform::from_position(Vec3::ZERO);
        let mut traversal = LinkTraversal::new();

        traversal.begin(ramp(), 2.0, 1.0, &mut nav);
        traversal.advance(0.1, &mut transform, &mut nav);

        assert!(transform.forward().z > 0.99);
    }
}
