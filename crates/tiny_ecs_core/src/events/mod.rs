//! Lifecycle event bus
//!
//! A small synchronous publish/subscribe channel. Listeners register under an
//! event name and may narrow what they receive to one entity or to entities
//! owning a set of components.

mod messenger;
mod subscription;

pub use messenger::Messenger;
pub use subscription::{Callback, Subscription, SubscriptionId};

use crate::ecs::{ComponentId, Entity};
use thiserror::Error;

/// Answers component-ownership questions for subscription filters.
pub trait ComponentInspector {
    fn has_all_components(&self, entity: Entity, components: &[ComponentId]) -> bool;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("subscription {subscription} is already restricted to {existing}")]
    EntityFilterAlreadySet {
        subscription: SubscriptionId,
        existing: Entity,
    },
}
