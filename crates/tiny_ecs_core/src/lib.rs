//! Tiny ECS Core
//!
//! A small entity-component store:
//! - Object pools for entities and component instances
//! - Component-set groups and tag lists, kept current on every change
//! - A synchronous event bus for entity and component lifecycle

pub mod ecs;
pub mod events;
pub mod pool;
pub mod settings;

pub use ecs::{Component, ComponentId, EcsError, Entity, EntityManager, EntityMut, EventBus};
pub use events::{Messenger, Subscription, SubscriptionId};
pub use settings::ManagerSettings;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
