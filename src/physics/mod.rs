//! Physics queries module
//!
//! Obstruction rays behind a small trait, with a rapier3d-backed world.

pub mod layers;
mod query;
mod world;

pub use query::{BodyId, EmptySpace, ObstructionQuery, RaycastHit};
pub use world::Physics;
