//! Entity store: entities, pooled components, component-set groups and tags.
//!
//! All mutation goes through [`EntityManager`], which keeps the derived
//! indexes in step with component and tag changes and announces lifecycle
//! changes on its [`EventBus`].

mod component;
mod entity;
mod error;
mod group;
mod manager;
mod storage;
mod tags;

pub use component::{meta_of, name_of, register_component, Component, ComponentId, ComponentMeta};
pub use entity::{Entity, ManagerId};
pub(crate) use entity::EntityRecord;
pub use error::EcsError;
pub(crate) use group::Group;
pub use group::GroupKey;
pub use manager::{EntityManager, EntityMut, EventBus, PoolReport};
pub(crate) use tags::TagIndex;
