//! Level-aware pursuit AI for 3D agents
//!
//! This crate provides:
//! - An NPC patrol / chase / search state machine
//! - A follower that routes across levels one link at a time
//! - Line-of-sight perception against an obstruction ray service
//! - Scripted link traversal on a parabolic arc
//! - A headless fixed-step engine, hecs world and rapier3d ray queries
//!   to run scenes end to end

pub mod ai;
pub mod core;
pub mod ecs;
pub mod navigation;
pub mod physics;
pub mod player;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier3d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        AgentContext, Follower, FollowerConfig, LevelAnchors, LevelMap, NavLink, Npc, NpcConfig,
        Perception, PursuitState, Target, WaypointPolicy,
    };
    pub use crate::core::{
        AgentEvent, Engine, EngineConfig, EngineContext, EngineError, EventQueue, Game, Scene,
        SceneError, Time,
    };
    pub use crate::ecs::{Locomotion, Name, Transform, World};
    pub use crate::navigation::{
        LinkData, MovementProfile, NavAgent, NavMesh, NavSurface, PathStatus, SandboxAgent,
    };
    pub use crate::physics::{BodyId, ObstructionQuery, Physics, RaycastHit, layers};
    pub use crate::player::{InputScript, LocomotionInput, PlayerConfig, PlayerController};
    pub use glam::{Quat, Vec2, Vec3};
}
