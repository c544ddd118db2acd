use crate::ecs::{ComponentId, Entity};
use thiserror::Error;

/// Lifecycle misuse reported by the entity manager.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EcsError {
    #[error("{entity} is not a live entity of this manager")]
    EntityNotFound { entity: Entity },

    #[error("component id {component} is already bound to '{existing}', cannot attach '{requested}'")]
    ComponentIdConflict {
        component: ComponentId,
        existing: &'static str,
        requested: &'static str,
    },
}
