//! Runtime settings

use serde::{Deserialize, Serialize};
use tiny_ecs_core::settings::{ManagerSettings, SettingsError};

/// Demo loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub manager: ManagerSettings,
    /// Entities spawned before the first tick.
    pub entities: usize,
    pub ticks: u32,
    pub step_seconds: f32,
    pub tagged_removals: Vec<TaggedRemoval>,
}

/// Remove every entity carrying `tag` at the start of `tick`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedRemoval {
    pub tick: u32,
    pub tag: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            manager: ManagerSettings::default(),
            entities: 8,
            ticks: 60,
            step_seconds: 1.0 / 60.0,
            tagged_removals: vec![TaggedRemoval {
                tick: 30,
                tag: "debris".to_string(),
            }],
        }
    }
}

impl RuntimeSettings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Removals scheduled for `tick`, in declaration order.
    pub fn removals_at(&self, tick: u32) -> impl Iterator<Item = &str> {
        self.tagged_removals
            .iter()
            .filter(move |removal| removal.tick == tick)
            .map(|removal| removal.tag.as_str())
    }
}
