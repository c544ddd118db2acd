//! Collaborators that read components but never change entity structure.

pub mod physics;
pub mod render;

pub use physics::{update_worlds, PhysicsWorld, Simulation};
pub use render::{draw_all, DrawFn, Renderable};
