//! Per-tick inputs shared by agent controllers

use glam::Vec3;
use hecs::Entity;

use super::perception::Target;
use crate::core::events::EventQueue;
use crate::navigation::NavAgent;
use crate::physics::ObstructionQuery;

/// Speed below which an agent counts as standing still
pub const MOVING_SPEED: f32 = 0.1;

/// Everything an agent reads or reports during one tick
pub struct AgentContext<'a> {
    /// The agent being ticked
    pub entity: Entity,
    /// Tick length in seconds
    pub dt: f32,
    /// Simulation time in seconds
    pub now: f64,
    /// Target snapshot, if there is one
    pub target: Option<Target>,
    /// Ray service for sight checks
    pub obstructions: &'a dyn ObstructionQuery,
    /// Event sink
    pub events: &'a mut EventQueue,
}

impl<'a> AgentContext<'a> {
    /// Create a context for one agent tick
    #[must_use]
    pub fn new(
        entity: Entity,
        dt: f32,
        now: f64,
        obstructions: &'a dyn ObstructionQuery,
        events: &'a mut EventQueue,
    ) -> Self {
        Self {
            entity,
            dt,
            now,
            target: None,
            obstructions,
            events,
        }
    }

    /// Set the target snapshot
    #[must_use]
    pub fn with_target(mut self, target: Option<Target>) -> Self {
        self.target = target;
        self
    }

    /// Target position, if there is a target
    #[must_use]
    pub fn target_position(&self) -> Option<Vec3> {
        self.target.map(|t| t.position)
    }
}

/// The navigation service is moving the agent
#[must_use]
pub fn nav_is_moving<N: NavAgent + ?Sized>(nav: &N) -> bool {
    !nav.is_stopped() && nav.velocity().length() > MOVING_SPEED
}
