//! Tiny ECS Runtime
//!
//! Runs the fixed-step demo loop. Takes an optional path to a JSON settings
//! file; defaults are used when none is given.

use anyhow::{Context, Result};
use tiny_ecs_runtime::demo;
use tiny_ecs_runtime::RuntimeSettings;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Tiny ECS v{}", tiny_ecs_core::VERSION);

    let settings = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings from {path}"))?;
            RuntimeSettings::from_json(&text).with_context(|| format!("in {path}"))?
        }
        None => RuntimeSettings::default(),
    };
    tracing::info!(
        ticks = settings.ticks,
        entities = settings.entities,
        "starting demo"
    );

    let report = demo::run(&settings)?;
    tracing::info!("Demo finished:\n{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
