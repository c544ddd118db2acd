//! Tiny ECS Runtime
//!
//! Boundary systems that drive an `EntityManager` from outside the core:
//! - Rendering of `Renderable` components through opaque draw callbacks
//! - Stepping of `PhysicsWorld` simulations
//! - A fixed-step demo loop used by the `tiny-ecs` binary

pub mod demo;
pub mod settings;
pub mod systems;

pub use settings::{RuntimeSettings, TaggedRemoval};

/// Runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
