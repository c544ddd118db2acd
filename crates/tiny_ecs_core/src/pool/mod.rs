//! Object pooling
//!
//! Entities and component instances are recycled through free lists instead of
//! being dropped and reallocated every time they are detached.

mod object_pool;

pub use object_pool::{growth_for, ObjectPool, PoolStats, Poolable, GROWTH_FACTOR};
