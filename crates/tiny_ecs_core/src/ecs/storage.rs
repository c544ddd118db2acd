// storage.rs - Per-type component pools with slot-indexed bindings
//
// Each component type gets one store: an object pool for recycled instances
// and a table mapping entity slots to the instance they currently own.

use crate::ecs::{Component, ComponentId};
use crate::pool::{ObjectPool, PoolStats};
use std::any::Any;

/// Type-erased view of a `ComponentStore<T>` so the manager can keep every
/// component type in one map.
pub(crate) trait ErasedStore: Any {
    fn component_id(&self) -> ComponentId;

    fn name(&self) -> &'static str;

    /// Return the instance bound to `slot` to the pool.
    fn release(&mut self, slot: usize) -> bool;

    fn stats(&self) -> PoolStats;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Pool plus bindings for a single component type.
pub(crate) struct ComponentStore<T: Component> {
    pool: ObjectPool<T>,
    bound: Vec<Option<T>>,
}

impl<T: Component> ComponentStore<T> {
    pub fn new(prealloc: usize) -> Self {
        let mut pool = ObjectPool::new(T::default);
        if prealloc > 0 {
            pool.expand(prealloc);
        }
        Self {
            pool,
            bound: Vec::new(),
        }
    }

    /// Acquire an instance and bind it to `slot`.
    ///
    /// Any instance already bound there is released first.
    pub fn attach(&mut self, slot: usize) -> &mut T {
        if self.bound.len() <= slot {
            self.bound.resize_with(slot + 1, || None);
        }
        if let Some(old) = self.bound[slot].take() {
            self.pool.release(old);
        }
        let item = self.pool.acquire();
        self.bound[slot].insert(item)
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        self.bound.get(slot)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.bound.get_mut(slot)?.as_mut()
    }
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn component_id(&self) -> ComponentId {
        T::ID
    }

    fn name(&self) -> &'static str {
        T::NAME
    }

    fn release(&mut self, slot: usize) -> bool {
        match self.bound.get_mut(slot).and_then(Option::take) {
            Some(item) => {
                self.pool.release(item);
                true
            }
            None => false,
        }
    }

    fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Fuel(u32);
    crate::poolable_by_default!(Fuel);
    crate::define_component!(Fuel, 7_001, "Fuel");

    #[test]
    fn test_attach_release_reuses_instances() {
        let mut store = ComponentStore::<Fuel>::new(0);
        store.attach(3).0 = 50;
        assert_eq!(store.get(3), Some(&Fuel(50)));
        assert!(store.get(0).is_none());
        assert_eq!(store.stats(), PoolStats { used: 1, size: 1 });

        assert!(store.release(3));
        assert!(!store.release(3));
        assert!(store.get(3).is_none());
        assert_eq!(store.stats(), PoolStats { used: 0, size: 1 });

        // recycled instance comes back reset
        assert_eq!(store.attach(1), &mut Fuel(0));
        assert_eq!(store.stats(), PoolStats { used: 1, size: 1 });
    }

    #[test]
    fn test_prealloc_and_downcast() {
        let store: Box<dyn ErasedStore> = Box::new(ComponentStore::<Fuel>::new(5));
        assert_eq!(store.stats(), PoolStats { used: 0, size: 5 });
        assert_eq!(store.component_id(), 7_001);
        assert_eq!(store.name(), "Fuel");
        assert!(store.as_any().downcast_ref::<ComponentStore<Fuel>>().is_some());
    }
}
