//! Pursuit AI module
//!
//! Provides perception, level-aware routing, link traversal, the NPC pursuit
//! state machine, the follower controller, and the steering used by the
//! sandbox navigation service.

mod context;
mod follower;
pub mod levels;
mod npc;
mod patrol;
mod perception;
mod routing;
pub mod steering;
pub mod task;
pub mod traversal;

pub use context::{AgentContext, MOVING_SPEED, nav_is_moving};
pub use follower::{Follower, FollowerConfig};
pub use levels::{LevelAnchors, LevelMap, NavLink, horizontal_distance};
pub use npc::{Npc, NpcConfig, PursuitState};
pub use patrol::{PatrolRoute, WaypointPolicy};
pub use perception::{FULL_VIEW_DEGREES, Perception, Target};
pub use routing::{RoutePoint, Router, SnapTolerances};
pub use steering::{Arrive, Motion, Seek, SteeringBehavior, SteeringOutput};
pub use task::{Cadence, Cooldown, Countdown, Dwell};
pub use traversal::{LinkTraversal, TraversalStatus};
