//! Tag index: tag name -> entities carrying it.

use crate::ecs::Entity;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct TagIndex {
    lists: HashMap<String, Vec<Entity>>,
}

impl TagIndex {
    /// Entities carrying `tag`, creating an empty entry on first use.
    pub fn entry(&mut self, tag: &str) -> &mut Vec<Entity> {
        self.lists.entry(tag.to_owned()).or_default()
    }

    pub fn get(&self, tag: &str) -> Option<&[Entity]> {
        self.lists.get(tag).map(Vec::as_slice)
    }

    pub fn insert(&mut self, tag: &str, entity: Entity) -> bool {
        let list = self.entry(tag);
        if list.contains(&entity) {
            return false;
        }
        list.push(entity);
        true
    }

    pub fn remove(&mut self, tag: &str, entity: Entity) -> bool {
        let Some(list) = self.lists.get_mut(tag) else {
            return false;
        };
        match list.iter().position(|&e| e == entity) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }
}
