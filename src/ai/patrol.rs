//! Patrol routes and waypoint selection

use std::sync::Arc;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the next waypoint is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaypointPolicy {
    /// 0, 1, 2, 0, 1, 2, ...
    #[default]
    Loop,
    /// 0, 1, 2, 1, 0, 1, ...
    PingPong,
    /// Uniform pick that never repeats the current waypoint
    Random,
}

/// Shared waypoints plus this agent's position in them
#[derive(Debug, Clone)]
pub struct PatrolRoute {
    waypoints: Arc<[Vec3]>,
    policy: WaypointPolicy,
    current: usize,
    forward: bool,
}

impl PatrolRoute {
    /// Start at the first waypoint
    #[must_use]
    pub fn new(waypoints: Arc<[Vec3]>, policy: WaypointPolicy) -> Self {
        Self {
            waypoints,
            policy,
            current: 0,
            forward: true,
        }
    }

    /// Current waypoint, if there are any
    #[must_use]
    pub fn current(&self) -> Option<Vec3> {
        self.waypoints.get(self.current).copied()
    }

    /// Index of the current waypoint
    #[must_use]
    pub fn index(&self) -> usize {
        self.current
    }

    /// Number of waypoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// No waypoints
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Selection policy
    #[must_use]
    pub fn policy(&self) -> WaypointPolicy {
        self.policy
    }

    /// Move to the next waypoint and return its index
    pub fn advance(&mut self, rng: &mut impl Rng) -> usize {
        let count = self.waypoints.len();
        if count <= 1 {
            self.current = 0;
            return 0;
        }

        self.current = match self.policy {
            WaypointPolicy::Loop => (self.current + 1) % count,
            WaypointPolicy::PingPong => {
                if self.forward && self.current + 1 >= count {
                    self.forward = false;
                } else if !self.forward && self.current == 0 {
                    self.forward = true;
                }
                if self.forward {
                    self.current + 1
                } else {
                    self.current - 1
                }
            }
            WaypointPolicy::Random => {
                // Pick among the other count - 1 waypoints
                let pick = rng.gen_range(0..count - 1);
                if pick >= self.current { pick + 1 } else { pick }
            }
        };
        self.current
    }
}
