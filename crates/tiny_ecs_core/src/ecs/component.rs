// component.rs - Static component identifiers and name registry
//
// Components are identified by u32 IDs declared on the type, never by
// runtime strings. The registry only exists so diagnostics can print names.

use crate::pool::Poolable;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

pub type ComponentId = u32;

/// Name and id of a registered component type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentMeta {
    pub id: ComponentId,
    pub name: &'static str,
}

static REGISTRY: Lazy<RwLock<HashMap<ComponentId, ComponentMeta>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a component's metadata.
///
/// Registering the same id twice with different names is a programmer error
/// (two types would share a pool slot) and panics.
pub fn register_component(meta: ComponentMeta) {
    let mut map = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(prev) = map.get(&meta.id) {
        assert_eq!(
            prev.name, meta.name,
            "Component id {} registered as both '{}' and '{}'",
            meta.id, prev.name, meta.name
        );
        return;
    }
    map.insert(meta.id, meta);
}

/// Look up component metadata by ID.
pub fn meta_of(id: ComponentId) -> Option<ComponentMeta> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned()
}

/// Display name for an id, falling back to `#<id>` for unregistered types.
pub fn name_of(id: ComponentId) -> String {
    meta_of(id)
        .map(|meta| meta.name.to_string())
        .unwrap_or_else(|| format!("#{id}"))
}

/// A plain data record that can be attached to an entity.
///
/// Instances are pooled per type: `Default` builds fresh ones and
/// [`Poolable::reinit`] resets recycled ones.
pub trait Component: Poolable + Default + 'static {
    /// Globally unique component ID.
    const ID: ComponentId;

    /// Human-readable name for debugging.
    const NAME: &'static str;

    /// Register this component's name with the global registry.
    fn ensure_registered() {
        register_component(ComponentMeta {
            id: Self::ID,
            name: Self::NAME,
        });
    }
}

/// Helper macro to implement the `Component` trait.
///
/// # Example
/// ```ignore
/// #[derive(Default)]
/// struct Position { x: f32, y: f32 }
///
/// poolable_by_default!(Position);
/// define_component!(Position, 1, "Position");
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty, $id:expr, $name:expr) => {
        impl $crate::ecs::Component for $ty {
            const ID: $crate::ecs::ComponentId = $id;
            const NAME: &'static str = $name;
        }
    };
}
