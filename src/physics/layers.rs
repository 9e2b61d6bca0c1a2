//! Collision layer bits shared by colliders and ray queries.
//!
//! A collider sits on one or more layers; a query mask selects which layers a
//! ray can hit. Perception rays use [`SIGHT_OBSTRUCTION`], so actors never
//! block each other's line of sight.

/// Walls, floors, terrain
pub const ENVIRONMENT: u32 = 0b0001;

/// Players, NPCs, followers
pub const ACTORS: u32 = 0b0010;

/// Obstacles that block sight but not movement, such as foliage
pub const SIGHT_BLOCKERS: u32 = 0b0100;

/// Default mask for line-of-sight rays
pub const SIGHT_OBSTRUCTION: u32 = ENVIRONMENT | SIGHT_BLOCKERS;

/// Default mask for ground casts
pub const GROUND: u32 = ENVIRONMENT;
