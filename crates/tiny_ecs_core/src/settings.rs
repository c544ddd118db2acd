//! Manager settings

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Pool pre-warming for an `EntityManager`.
///
/// Both capacities default to zero, in which case pools start empty and grow
/// on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    /// Entity records allocated up front.
    pub entity_pool_capacity: usize,
    /// Instances allocated when a component type's pool is first created.
    pub component_pool_capacity: usize,
}

impl ManagerSettings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
