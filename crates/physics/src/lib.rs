//! Rigid-body physics for the demo, on top of rapier.
//!
//! The world is set up once (layers, listeners, bodies) and then advanced
//! from the frame loop at a fixed timestep.
//!
//! # Invariants
//! - Static bodies never collide with each other.
//! - Simulation always advances in whole `timestep` increments.

mod demo;
mod layers;
mod listener;
mod world;

pub use demo::BouncingSphere;
pub use layers::ObjectLayer;
pub use listener::{Activation, ActivationChange, ContactStats};
pub use world::{BodyId, PhysicsSettings, PhysicsWorld};

pub fn crate_info() -> &'static str {
    "heavens-physics v0.1.0"
}
