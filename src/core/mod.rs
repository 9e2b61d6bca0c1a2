//! Core engine module
//!
//! Contains the headless Engine, the simulation clock, agent events and
//! scene files

mod engine;
pub mod events;
pub mod scene;
mod time;

pub use engine::{Engine, EngineConfig, EngineContext, EngineError, Game};
pub use events::{AgentEvent, EventQueue};
pub use scene::{FollowerSpawn, NpcSpawn, PlayerSpawn, Scene, SceneError, WallDef};
pub use time::Time;
