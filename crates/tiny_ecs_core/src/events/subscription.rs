use crate::ecs::{Component, ComponentId, Entity};
use crate::events::{ComponentInspector, EventError};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Listener invoked with the host context, the entity the event concerns
/// (if any) and an opaque payload.
pub type Callback<C> = Rc<dyn Fn(&mut C, Option<Entity>, &dyn Any)>;

/// Handle assigned to each registered listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

impl SubscriptionId {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Return the raw index backing this handle.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A callback registered under one event name, with optional filters.
pub struct Subscription<C> {
    id: SubscriptionId,
    name: String,
    callback: Callback<C>,
    entity: Option<Entity>,
    components: Vec<ComponentId>,
}

impl<C> Subscription<C> {
    pub(crate) fn new(id: SubscriptionId, name: String, callback: Callback<C>) -> Self {
        Self {
            id,
            name,
            callback,
            entity: None,
            components: Vec::new(),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Event name this subscription listens to.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity_filter(&self) -> Option<Entity> {
        self.entity
    }

    pub fn component_filter(&self) -> &[ComponentId] {
        &self.components
    }

    /// Only fire for `entity`.
    ///
    /// The filter can be set once; a second call fails and keeps the first
    /// entity.
    pub fn where_entity_is(&mut self, entity: Entity) -> Result<&mut Self, EventError> {
        if let Some(existing) = self.entity {
            return Err(EventError::EntityFilterAlreadySet {
                subscription: self.id,
                existing,
            });
        }
        self.entity = Some(entity);
        Ok(self)
    }

    /// Only fire when the entity owns `component` (cumulative).
    pub fn where_component_is(&mut self, component: ComponentId) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Typed shorthand for [`Self::where_component_is`].
    pub fn where_component<T: Component>(&mut self) -> &mut Self {
        T::ensure_registered();
        self.where_component_is(T::ID)
    }

    /// Only fire when the entity owns every component in `components`.
    pub fn where_components_are(&mut self, components: &[ComponentId]) -> &mut Self {
        self.components.extend_from_slice(components);
        self
    }

    /// Name, entity and component filters, in that order.
    ///
    /// The component check is skipped for events that carry no entity.
    pub(crate) fn matches(
        &self,
        name: &str,
        entity: Option<Entity>,
        inspector: &dyn ComponentInspector,
    ) -> bool {
        if name != self.name {
            return false;
        }

        if self.entity.is_some() && self.entity != entity {
            return false;
        }

        match entity {
            Some(entity) if !self.components.is_empty() => {
                inspector.has_all_components(entity, &self.components)
            }
            _ => true,
        }
    }

    pub(crate) fn callback(&self) -> Callback<C> {
        Rc::clone(&self.callback)
    }
}

impl<C> fmt::Debug for Subscription<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("entity", &self.entity)
            .field("components", &self.components)
            .finish_non_exhaustive()
    }
}
