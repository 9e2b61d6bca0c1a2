//! Level-aware route points
//!
//! Climbing goes one level at a time through a link; descending and moving
//! on the same level head straight for the target.

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::levels::LevelMap;
use crate::navigation::{NavAgent, snap_to_walkable};

/// Search radii used when snapping route points to walkable ground
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapTolerances {
    /// Around a link endpoint
    pub link: f32,
    /// Around the target
    pub target: f32,
    /// Around a guessed point on the next level up
    pub climb: f32,
}

impl Default for SnapTolerances {
    fn default() -> Self {
        Self {
            link: 1.0,
            target: 2.0,
            climb: 5.0,
        }
    }
}

/// Picks where an agent should walk next to reach a target on any level
#[derive(Debug, Clone)]
pub struct Router {
    map: Arc<LevelMap>,
    tolerances: SnapTolerances,
}

impl Router {
    /// Create a router over a shared level map
    #[must_use]
    pub fn new(map: Arc<LevelMap>) -> Self {
        Self {
            map,
            tolerances: SnapTolerances::default(),
        }
    }

    /// Set snap tolerances
    #[must_use]
    pub fn with_tolerances(mut self, tolerances: SnapTolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    /// The level map
    #[must_use]
    pub fn map(&self) -> &LevelMap {
        &self.map
    }

    /// Next point to path toward, snapped to walkable ground where possible
    pub fn next_target_point<N: NavAgent + ?Sized>(
        &self,
        agent_position: Vec3,
        target_position: Vec3,
        nav: &N,
    ) -> Vec3 {
        self.route(agent_position, target_position, nav).point
    }

    /// Like [`Self::next_target_point`], also telling whether the point is
    /// the foot of a link up to the next level
    pub fn route<N: NavAgent + ?Sized>(
        &self,
        agent_position: Vec3,
        target_position: Vec3,
        nav: &N,
    ) -> RoutePoint {
        let agent_level = self.map.level_of(agent_position);
        let target_level = self.map.level_of(target_position);

        if target_level <= agent_level {
            return RoutePoint::walk(snap_to_walkable(nav, target_position, self.tolerances.target));
        }

        let next_level = agent_level + 1;
        if let Some(endpoint) = self
            .map
            .find_link(agent_level, next_level, agent_position)
            .and_then(|link| link.endpoint_on(agent_level, &self.map.anchors))
        {
            log::trace!("routing via link at {endpoint} to reach level {next_level}");
            return RoutePoint {
                point: snap_to_walkable(nav, endpoint, self.tolerances.link),
                link_entry: true,
            };
        }

        let height = self
            .map
            .anchors
            .height_of(next_level)
            .unwrap_or(target_position.y);
        let guess = Vec3::new(target_position.x, height, target_position.z);
        log::trace!("no link from level {agent_level} to {next_level}, heading for {guess}");
        RoutePoint::walk(snap_to_walkable(nav, guess, self.tolerances.climb))
    }
}

/// Result of [`Router::route`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePoint {
    /// Where to path next
    pub point: Vec3,
    /// The point is where a climbing link starts
    pub link_entry: bool,
}

impl RoutePoint {
    fn walk(point: Vec3) -> Self {
        Self {
            point,
            link_entry: false,
        }
    }
}
