// group.rs - Component-set groups
//
// A group is the materialized list of entities owning every component in a
// fixed set. Groups are keyed by the sorted, deduplicated set so that
// [A, B] and [B, A] resolve to the same index.

use crate::ecs::{name_of, ComponentId, Entity};
use std::fmt;

/// Canonical key for a set of component types.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(Vec<ComponentId>);

impl GroupKey {
    /// Build a key from any ordering of component IDs.
    ///
    /// The input will be sorted and deduplicated.
    pub fn from_components(comps: &[ComponentId]) -> Self {
        let mut comps = comps.to_vec();
        comps.sort_unstable();
        comps.dedup();
        Self(comps)
    }

    pub fn components(&self) -> &[ComponentId] {
        &self.0
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lower-cased names joined with `-`, e.g. `position-velocity`.
impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.0.iter().map(|&id| name_of(id).to_lowercase()).collect();
        names.sort();
        write!(f, "{}", names.join("-"))
    }
}

/// Entities currently owning every component in `key`.
#[derive(Debug)]
pub(crate) struct Group {
    pub key: GroupKey,
    pub entities: Vec<Entity>,
}

impl Group {
    pub fn new(key: GroupKey) -> Self {
        Self {
            key,
            entities: Vec::new(),
        }
    }

    /// Add `entity` unless it is already indexed.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if self.entities.contains(&entity) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    /// Drop `entity`, keeping the relative order of the rest.
    pub fn remove(&mut self, entity: Entity) -> bool {
        match self.entities.iter().position(|&e| e == entity) {
            Some(pos) => {
                self.entities.remove(pos);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{register_component, ComponentMeta};

    #[test]
    fn test_key_ignores_order_and_duplicates() {
        let a = GroupKey::from_components(&[3, 1, 2]);
        let b = GroupKey::from_components(&[2, 3, 1, 1]);
        assert_eq!(a, b);
        assert_eq!(a.components(), &[1, 2, 3]);
        assert!(a.contains(2));
        assert!(!a.contains(4));
    }

    #[test]
    fn test_key_display_uses_lowercase_names() {
        register_component(ComponentMeta {
            id: 8_001,
            name: "Velocity",
        });
        register_component(ComponentMeta {
            id: 8_002,
            name: "Position",
        });
        let key = GroupKey::from_components(&[8_001, 8_002]);
        assert_eq!(key.to_string(), "position-velocity");
    }

    #[test]
    fn test_group_insert_is_idempotent() {
        let mut group = Group::new(GroupKey::from_components(&[1]));
        let e = Entity::new(0, 10);
        assert!(group.insert(e));
        assert!(!group.insert(e));
        assert_eq!(group.entities.len(), 1);
        assert!(group.remove(e));
        assert!(!group.remove(e));
    }
}
