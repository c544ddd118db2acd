// manager.rs - Entity manager: lifecycle, component pools, groups, tags, events
//
// Every mutation of entities flows through here so the derived indexes
// (groups, tag lists, per-entity membership) stay consistent. Event
// listeners run synchronously and may call back into the manager, so every
// operation re-checks liveness after raising an event.

use crate::ecs::storage::{ComponentStore, ErasedStore};
use crate::ecs::{
    Component, ComponentId, EcsError, Entity, EntityRecord, Group, GroupKey, ManagerId, TagIndex,
};
use crate::events::{ComponentInspector, Messenger};
use crate::pool::{ObjectPool, PoolStats};
use crate::settings::ManagerSettings;
use serde::Serialize;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace, warn};

/// Event bus whose listeners receive the manager that raised the event.
pub type EventBus = Messenger<EntityManager>;

/// Pool usage for the entity pool and every component pool.
///
/// Component pools are keyed by lower-cased component name, see
/// [`EntityManager::pool_stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolReport {
    pub entity: PoolStats,
    pub components: BTreeMap<String, PoolStats>,
}

impl PoolReport {
    pub fn component(&self, name: &str) -> Option<PoolStats> {
        self.components.get(&name.to_lowercase()).copied()
    }
}

/// Creates, mutates and destroys entities and keeps their indexes current.
pub struct EntityManager {
    id: ManagerId,
    settings: ManagerSettings,
    messenger: Option<EventBus>,
    entities: Vec<Entity>,
    records: Vec<Option<EntityRecord>>,
    free_slots: Vec<u32>,
    entity_pool: ObjectPool<EntityRecord>,
    stores: HashMap<ComponentId, Box<dyn ErasedStore>>,
    groups: HashMap<GroupKey, Group>,
    tags: TagIndex,
}

impl EntityManager {
    /// Fired AFTER an entity has been created.
    pub const ENTITY_CREATED: &'static str = "EntityManager#ENTITY_CREATED";

    /// Fired BEFORE an entity is removed, while it still owns its components,
    /// tags and group memberships. The per-component `COMPONENT_REMOVE`
    /// events follow it, so listeners here can still read everything the
    /// entity carries.
    pub const ENTITY_REMOVE: &'static str = "EntityManager#ENTITY_REMOVE";

    /// Fired AFTER a component has been attached and indexed.
    /// Payload: the `ComponentId`.
    pub const COMPONENT_ADDED: &'static str = "EntityManager#COMPONENT_ADDED";

    /// Fired BEFORE a component is detached. Payload: the `ComponentId`.
    pub const COMPONENT_REMOVE: &'static str = "EntityManager#COMPONENT_REMOVE";

    /// Create a manager with no event bus and empty pools.
    pub fn new() -> Self {
        Self::with_settings(ManagerSettings::default())
    }

    pub fn with_settings(settings: ManagerSettings) -> Self {
        let mut entity_pool = ObjectPool::default();
        if settings.entity_pool_capacity > 0 {
            entity_pool.expand(settings.entity_pool_capacity);
        }
        Self {
            id: ManagerId::next(),
            settings,
            messenger: None,
            entities: Vec::new(),
            records: Vec::new(),
            free_slots: Vec::new(),
            entity_pool,
            stores: HashMap::new(),
            groups: HashMap::new(),
            tags: TagIndex::default(),
        }
    }

    /// Attach an event bus (builder style).
    pub fn with_messenger(mut self, messenger: EventBus) -> Self {
        self.messenger = Some(messenger);
        self
    }

    /// Replace the event bus, returning the previous one.
    pub fn set_messenger(&mut self, messenger: Option<EventBus>) -> Option<EventBus> {
        std::mem::replace(&mut self.messenger, messenger)
    }

    pub fn messenger(&self) -> Option<&EventBus> {
        self.messenger.as_ref()
    }

    pub fn messenger_mut(&mut self) -> Option<&mut EventBus> {
        self.messenger.as_mut()
    }

    pub fn id(&self) -> ManagerId {
        self.id
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Entity lifecycle
    // ------------------------------------------------------------------

    /// Get a new entity.
    pub fn create_entity(&mut self) -> Entity {
        let mut record = self.entity_pool.acquire();
        record.manager = Some(self.id);

        let slot = match self.free_slots.pop() {
            Some(slot) => slot as usize,
            None => {
                self.records.push(None);
                self.records.len() - 1
            }
        };
        let entity = Entity::new(slot as u32, record.id);
        self.records[slot] = Some(record);
        self.entities.push(entity);

        debug!(%entity, live = self.entities.len(), "entity created");
        self.trigger(Self::ENTITY_CREATED, Some(entity), &());
        entity
    }

    /// Drop an entity. Fires the removal events for the entity and each of
    /// its components, then returns it to the pool.
    ///
    /// Calling this again for an entity whose removal is already under way
    /// (from one of its removal listeners) is a no-op.
    pub fn remove_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        {
            let record = self.live_record_mut(entity)?;
            if record.removing {
                return Ok(());
            }
            record.removing = true;
        }

        self.trigger(Self::ENTITY_REMOVE, Some(entity), &());
        if !self.is_alive(entity) {
            trace!(%entity, "entity removed by a listener");
            return Ok(());
        }

        self.remove_all_components(entity)?;

        let Some(mut record) = self.records.get_mut(entity.slot()).and_then(Option::take) else {
            return Ok(());
        };
        if record.id != entity.id() {
            // slot was recycled by a listener; put the other entity back
            self.records[entity.slot()] = Some(record);
            return Ok(());
        }

        // left over: still mid-detach further up the stack, or attached by a
        // listener while we were stripping
        for cid in record.components.drain(..) {
            if record.detaching.contains(&cid) {
                trace!(%entity, component = cid, "releasing component mid-detach");
            } else {
                warn!(
                    %entity,
                    component = cid,
                    "component attached during removal, releasing silently"
                );
            }
            self.unindex_component(entity, cid);
        }

        if let Some(pos) = self.entities.iter().position(|&e| e == entity) {
            self.entities.remove(pos);
        }
        for tag in record.tags.drain(..) {
            self.tags.remove(&tag, entity);
        }

        record.manager = None;
        self.entity_pool.release(record);
        self.free_slots.push(entity.slot() as u32);

        debug!(%entity, live = self.entities.len(), "entity removed");
        Ok(())
    }

    /// Remove every entity carrying `tag`.
    pub fn remove_entities_by_tag(&mut self, tag: &str) -> Result<(), EcsError> {
        let mut index = self.tags.get(tag).map_or(0, <[Entity]>::len);
        debug!(tag, count = index, "removing tagged entities");

        while index > 0 {
            index -= 1;
            let Some(entity) = self.tags.get(tag).and_then(|list| list.get(index)).copied() else {
                continue;
            };
            self.remove_entity(entity)?;
        }
        Ok(())
    }

    /// Dump all entities out of the manager.
    pub fn remove_all_entities(&mut self) -> Result<(), EcsError> {
        let mut index = self.entities.len();
        while index > 0 {
            index -= 1;
            let Some(&entity) = self.entities.get(index) else {
                continue;
            };
            self.remove_entity(entity)?;
        }
        Ok(())
    }

    /// Borrow an entity through a mutation facade. `None` if it is not live.
    pub fn entity_mut(&mut self, entity: Entity) -> Option<EntityMut<'_>> {
        if self.is_alive(entity) {
            Some(EntityMut {
                manager: self,
                entity,
            })
        } else {
            None
        }
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.record(entity).is_some()
    }

    /// Total number of live entities.
    pub fn count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in creation order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Attach a pooled `T` to `entity`. No-op if it already has one.
    pub fn add_component<T: Component>(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.add_component_with::<T, _>(entity, |_| {})
    }

    /// Attach a pooled `T` and run `init` on it before the entity is indexed
    /// and `COMPONENT_ADDED` fires. `init` is not called if `entity` already
    /// owns a `T`.
    pub fn add_component_with<T, F>(&mut self, entity: Entity, init: F) -> Result<(), EcsError>
    where
        T: Component,
        F: FnOnce(&mut T),
    {
        if self.live_record(entity)?.has_component(T::ID) {
            return Ok(());
        }

        T::ensure_registered();
        let prealloc = self.settings.component_pool_capacity;
        let store = self.stores.entry(T::ID).or_insert_with(|| {
            debug!(component = T::NAME, prealloc, "component pool created");
            Box::new(ComponentStore::<T>::new(prealloc))
        });
        let existing = store.name();
        let Some(store) = store.as_any_mut().downcast_mut::<ComponentStore<T>>() else {
            return Err(EcsError::ComponentIdConflict {
                component: T::ID,
                existing,
                requested: T::NAME,
            });
        };
        init(store.attach(entity.slot()));

        if let Some(record) = self.record_mut(entity) {
            record.components.push(T::ID);
        }
        self.index_entity(entity);

        trace!(%entity, component = T::NAME, "component added");
        self.trigger(Self::COMPONENT_ADDED, Some(entity), &T::ID);
        Ok(())
    }

    /// Detach `T` from `entity`. No-op if it has none.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.remove_component_by_id(entity, T::ID)
    }

    /// Detach the component with id `component`. Fires `COMPONENT_REMOVE`
    /// before anything is changed.
    ///
    /// While that event is being dispatched, further requests to detach the
    /// same component from the same entity are ignored.
    pub fn remove_component_by_id(
        &mut self,
        entity: Entity,
        component: ComponentId,
    ) -> Result<(), EcsError> {
        {
            let record = self.live_record_mut(entity)?;
            if !record.has_component(component) || record.detaching.contains(&component) {
                return Ok(());
            }
            record.detaching.push(component);
        }

        self.trigger(Self::COMPONENT_REMOVE, Some(entity), &component);

        // a listener may have detached it, or removed the entity, already
        let Some(record) = self.record_mut(entity) else {
            return Ok(());
        };
        record.detaching.retain(|&c| c != component);
        let Some(pos) = record.components.iter().position(|&c| c == component) else {
            return Ok(());
        };
        record.components.remove(pos);
        self.unindex_component(entity, component);

        trace!(%entity, component, "component removed");
        Ok(())
    }

    /// Drop all components on an entity, newest first.
    pub fn remove_all_components(&mut self, entity: Entity) -> Result<(), EcsError> {
        let mut index = self.live_record(entity)?.components.len();
        while index > 0 {
            index -= 1;
            let Some(record) = self.record(entity) else {
                break;
            };
            let Some(&component) = record.components.get(index) else {
                continue;
            };
            self.remove_component_by_id(entity, component)?;
        }
        Ok(())
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.record(entity)?;
        self.stores
            .get(&T::ID)?
            .as_any()
            .downcast_ref::<ComponentStore<T>>()?
            .get(entity.slot())
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.record(entity)?;
        self.stores
            .get_mut(&T::ID)?
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()?
            .get_mut(entity.slot())
    }

    pub fn has_component(&self, entity: Entity, component: ComponentId) -> bool {
        self.record(entity)
            .is_some_and(|record| record.has_component(component))
    }

    pub fn has_all_components(&self, entity: Entity, components: &[ComponentId]) -> bool {
        self.record(entity)
            .is_some_and(|record| record.has_all_components(components))
    }

    /// Component ids owned by `entity`, in attach order. Empty if not live.
    pub fn components_of(&self, entity: Entity) -> &[ComponentId] {
        self.record(entity)
            .map(|record| record.components.as_slice())
            .unwrap_or(&[])
    }

    // ------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------

    pub fn add_tag(&mut self, entity: Entity, tag: &str) -> Result<(), EcsError> {
        {
            let record = self.live_record_mut(entity)?;
            if record.has_tag(tag) {
                return Ok(());
            }
            record.tags.push(tag.to_owned());
        }
        self.tags.insert(tag, entity);
        Ok(())
    }

    pub fn remove_tag(&mut self, entity: Entity, tag: &str) -> Result<(), EcsError> {
        {
            let record = self.live_record_mut(entity)?;
            let Some(pos) = record.tags.iter().position(|t| t == tag) else {
                return Ok(());
            };
            record.tags.remove(pos);
        }
        self.tags.remove(tag, entity);
        Ok(())
    }

    pub fn has_tag(&self, entity: Entity, tag: &str) -> bool {
        self.record(entity).is_some_and(|record| record.has_tag(tag))
    }

    /// Tags carried by `entity`. Empty if not live.
    pub fn tags_of(&self, entity: Entity) -> &[String] {
        self.record(entity)
            .map(|record| record.tags.as_slice())
            .unwrap_or(&[])
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Entities owning every component in `components`.
    ///
    /// The first query for a set builds its group with one scan; afterwards
    /// the group is kept current by attach/detach and returned directly.
    /// An empty set matches every live entity.
    pub fn query_components(&mut self, components: &[ComponentId]) -> &[Entity] {
        let key = self.index_group(components);
        self.group(&key)
    }

    /// Make sure a group exists for `components` and return its key.
    pub fn index_group(&mut self, components: &[ComponentId]) -> GroupKey {
        let key = GroupKey::from_components(components);
        if key.is_empty() || self.groups.contains_key(&key) {
            return key;
        }

        let mut group = Group::new(key.clone());
        for &entity in &self.entities {
            let satisfied = self.records[entity.slot()]
                .as_ref()
                .is_some_and(|record| record.has_all_components(key.components()));
            if satisfied {
                group.entities.push(entity);
            }
        }
        debug!(group = %key, members = group.entities.len(), "group indexed");
        self.groups.insert(key.clone(), group);
        key
    }

    /// Members of an indexed group. Empty if the group was never indexed.
    pub fn group(&self, key: &GroupKey) -> &[Entity] {
        if key.is_empty() {
            return &self.entities;
        }
        self.groups
            .get(key)
            .map(|group| group.entities.as_slice())
            .unwrap_or(&[])
    }

    /// Number of component-set groups indexed so far.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of tag names seen so far, including ones with no entities left.
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Entities carrying `tag`, creating an empty entry on first use.
    pub fn query_tag(&mut self, tag: &str) -> &[Entity] {
        self.tags.entry(tag).as_slice()
    }

    /// Read-only variant of [`Self::query_tag`].
    pub fn tagged(&self, tag: &str) -> &[Entity] {
        self.tags.get(tag).unwrap_or(&[])
    }

    // ------------------------------------------------------------------
    // Diagnostics and events
    // ------------------------------------------------------------------

    /// Usage of the entity pool and of every component pool.
    ///
    /// Pools are keyed by lower-cased name. When two ids share a lower-cased
    /// name, the higher id is reported as `name#id`.
    pub fn pool_stats(&self) -> PoolReport {
        let mut ids: Vec<ComponentId> = self.stores.keys().copied().collect();
        ids.sort_unstable();

        let mut components = BTreeMap::new();
        for id in ids {
            let Some(store) = self.stores.get(&id) else {
                continue;
            };
            let mut key = store.name().to_lowercase();
            if components.contains_key(&key) {
                key = format!("{key}#{id}");
            }
            components.insert(key, store.stats());
        }

        PoolReport {
            entity: self.entity_pool.stats(),
            components,
        }
    }

    /// Raise `event_name` on the event bus, if one is attached.
    pub fn trigger(&mut self, event_name: &str, entity: Option<Entity>, payload: &dyn Any) {
        let listeners = match self.messenger.as_mut() {
            Some(bus) => bus.begin(event_name),
            None => return,
        };
        trace!(event = event_name, ?entity, listeners = listeners.len(), "trigger");

        for id in listeners {
            // the bus is out of `self` only while this listener is tested
            let Some(mut bus) = self.messenger.take() else {
                return;
            };
            let callback = bus.accept(id, event_name, entity, &*self);
            self.messenger = Some(bus);

            if let Some(callback) = callback {
                callback(&mut *self, entity, payload);
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn record(&self, entity: Entity) -> Option<&EntityRecord> {
        self.records
            .get(entity.slot())?
            .as_ref()
            .filter(|record| record.id == entity.id() && record.manager == Some(self.id))
    }

    fn record_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        let id = self.id;
        self.records
            .get_mut(entity.slot())?
            .as_mut()
            .filter(|record| record.id == entity.id() && record.manager == Some(id))
    }

    fn live_record(&self, entity: Entity) -> Result<&EntityRecord, EcsError> {
        self.record(entity).ok_or(EcsError::EntityNotFound { entity })
    }

    fn live_record_mut(&mut self, entity: Entity) -> Result<&mut EntityRecord, EcsError> {
        self.record_mut(entity).ok_or(EcsError::EntityNotFound { entity })
    }

    /// Add `entity` to every group it now fully satisfies.
    fn index_entity(&mut self, entity: Entity) {
        let Some(record) = self.records.get(entity.slot()).and_then(Option::as_ref) else {
            return;
        };
        for group in self.groups.values_mut() {
            if record.has_all_components(group.key.components()) && group.insert(entity) {
                trace!(%entity, group = %group.key, "joined group");
            }
        }
    }

    /// Remove `entity` from groups that need `component` and release the
    /// instance bound to it.
    fn unindex_component(&mut self, entity: Entity, component: ComponentId) {
        for group in self.groups.values_mut() {
            if group.key.contains(component) && group.remove(entity) {
                trace!(%entity, group = %group.key, "left group");
            }
        }
        if let Some(store) = self.stores.get_mut(&component) {
            debug_assert_eq!(store.component_id(), component);
            store.release(entity.slot());
        }
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentInspector for EntityManager {
    fn has_all_components(&self, entity: Entity, components: &[ComponentId]) -> bool {
        EntityManager::has_all_components(self, entity, components)
    }
}

/// Mutation facade for one live entity.
///
/// Every method routes through the owning [`EntityManager`].
pub struct EntityMut<'a> {
    manager: &'a mut EntityManager,
    entity: Entity,
}

impl<'a> EntityMut<'a> {
    pub fn id(&self) -> Entity {
        self.entity
    }

    pub fn add_component<T: Component>(&mut self) -> Result<&mut Self, EcsError> {
        self.manager.add_component::<T>(self.entity)?;
        Ok(self)
    }

    pub fn add_component_with<T, F>(&mut self, init: F) -> Result<&mut Self, EcsError>
    where
        T: Component,
        F: FnOnce(&mut T),
    {
        self.manager.add_component_with::<T, F>(self.entity, init)?;
        Ok(self)
    }

    pub fn remove_component<T: Component>(&mut self) -> Result<&mut Self, EcsError> {
        self.manager.remove_component::<T>(self.entity)?;
        Ok(self)
    }

    pub fn remove_all_components(&mut self) -> Result<&mut Self, EcsError> {
        self.manager.remove_all_components(self.entity)?;
        Ok(self)
    }

    pub fn has_component<T: Component>(&self) -> bool {
        self.manager.has_component(self.entity, T::ID)
    }

    pub fn has_all_components(&self, components: &[ComponentId]) -> bool {
        self.manager.has_all_components(self.entity, components)
    }

    pub fn get<T: Component>(&self) -> Option<&T> {
        self.manager.get_component::<T>(self.entity)
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.manager.get_component_mut::<T>(self.entity)
    }

    pub fn add_tag(&mut self, tag: &str) -> Result<&mut Self, EcsError> {
        self.manager.add_tag(self.entity, tag)?;
        Ok(self)
    }

    pub fn remove_tag(&mut self, tag: &str) -> Result<&mut Self, EcsError> {
        self.manager.remove_tag(self.entity, tag)?;
        Ok(self)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.manager.has_tag(self.entity, tag)
    }

    /// Raise `event_name` for this entity.
    pub fn trigger(&mut self, event_name: &str, payload: &dyn Any) -> &mut Self {
        self.manager.trigger(event_name, Some(self.entity), payload);
        self
    }

    /// Remove the entity from its manager.
    pub fn remove(self) -> Result<(), EcsError> {
        self.manager.remove_entity(self.entity)
    }
}
