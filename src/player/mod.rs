//! Player locomotion module
//!
//! Moves the pursued character from input: camera-relative walking, jumping,
//! gravity, and ground snapping.

mod controller;
mod input;

pub use controller::{PlayerConfig, PlayerController};
pub use input::{InputScript, InputStep, LocomotionInput};
