//! Entity handle and pooled per-entity bookkeeping
//!
//! Entities are lightweight handles (slot + id) that reference a record owned
//! by an `EntityManager`. Ids come from a process-wide counter and are never
//! handed out twice, so a handle whose slot was recycled no longer matches the
//! record living there.

use crate::ecs::ComponentId;
use crate::pool::Poolable;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(0);
static NEXT_MANAGER_ID: AtomicU32 = AtomicU32::new(0);

fn next_entity_id() -> u64 {
    NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity of one `EntityManager` instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ManagerId(u32);

impl ManagerId {
    pub(crate) fn next() -> Self {
        Self(NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Entity handle
///
/// Format: [32-bit slot | 64-bit id]
/// - Slot: Position in the manager's record table (reused after removal)
/// - Id: Globally unique, never reused
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Entity {
    slot: u32,
    id: u64,
}

impl Entity {
    pub(crate) const fn new(slot: u32, id: u64) -> Self {
        Self { slot, id }
    }

    /// Process-unique identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot as usize
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity#{}", self.id)
    }
}

/// Membership bookkeeping for one entity, recycled through the entity pool.
#[derive(Debug, Default)]
pub(crate) struct EntityRecord {
    pub id: u64,
    pub manager: Option<ManagerId>,
    pub components: Vec<ComponentId>,
    pub tags: Vec<String>,
    /// Set once `remove_entity` has started on this record.
    pub removing: bool,
    /// Components whose removal event is being dispatched.
    pub detaching: Vec<ComponentId>,
}

impl EntityRecord {
    pub fn has_component(&self, id: ComponentId) -> bool {
        self.components.contains(&id)
    }

    pub fn has_all_components(&self, ids: &[ComponentId]) -> bool {
        ids.iter().all(|id| self.components.contains(id))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl Poolable for EntityRecord {
    fn reinit(&mut self) {
        self.id = next_entity_id();
        self.manager = None;
        self.components.clear();
        self.tags.clear();
        self.removing = false;
        self.detaching.clear();
    }
}
