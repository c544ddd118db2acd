//! Fixed-step demo loop
//!
//! Spawns a mix of "ship" and "debris" entities, each with a falling body and
//! a draw callback, then ticks physics and rendering while scheduled tag
//! removals thin the population out.

use crate::settings::RuntimeSettings;
use crate::systems::{draw_all, update_worlds, DrawFn, PhysicsWorld, Renderable, Simulation};
use serde::Serialize;
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;
use tiny_ecs_core::ecs::{EcsError, Entity, EntityManager, EventBus, PoolReport};
use tracing::{debug, info};

const GRAVITY: f32 = -9.81;

/// Point mass under gravity plus whatever force was applied this tick.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Body {
    pub height: f32,
    pub velocity: f32,
    pub force: f32,
}

impl Simulation for Body {
    fn step(&mut self, dt: f32) {
        self.velocity += (GRAVITY + self.force) * dt;
        self.height = (self.height + self.velocity * dt).max(0.0);
    }

    fn clear_forces(&mut self) {
        self.force = 0.0;
    }
}

/// Outcome of one demo run.
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub ticks: u32,
    pub spawned: usize,
    pub removed: usize,
    pub live: usize,
    pub steps: usize,
    pub draws: usize,
    pub events_fired: u64,
    pub pools: PoolReport,
}

fn frame_writer() -> DrawFn {
    Rc::new(|ctx: &mut dyn Any, params: Option<&dyn Any>| {
        if let (Some(frame), Some(label)) = (
            ctx.downcast_mut::<Vec<String>>(),
            params.and_then(|p| p.downcast_ref::<String>()),
        ) {
            frame.push(label.clone());
        }
    })
}

fn spawn(manager: &mut EntityManager, index: usize) -> Result<Entity, EcsError> {
    let tag = if index % 2 == 0 { "debris" } else { "ship" };
    let entity = manager.create_entity();
    let label = format!("{tag}-{index}");

    manager
        .entity_mut(entity)
        .ok_or(EcsError::EntityNotFound { entity })?
        .add_tag(tag)?
        .add_component_with::<PhysicsWorld, _>(|world: &mut PhysicsWorld| {
            *world = PhysicsWorld::new(Body {
                height: 10.0 + index as f32,
                ..Body::default()
            })
        })?
        .add_component_with::<Renderable, _>(|r: &mut Renderable| {
            *r = Renderable::new(frame_writer(), label)
        })?;
    Ok(entity)
}

/// Run the demo with `settings` and report what happened.
pub fn run(settings: &RuntimeSettings) -> Result<DemoReport, EcsError> {
    let removed = Rc::new(Cell::new(0usize));
    let mut bus = EventBus::new();
    bus.listen_to(
        EntityManager::ENTITY_CREATED,
        |_: &mut EntityManager, entity: Option<Entity>, _: &dyn Any| {
            debug!(?entity, "spawned");
        },
    );
    let counter = Rc::clone(&removed);
    bus.listen_to(
        EntityManager::ENTITY_REMOVE,
        move |manager: &mut EntityManager, entity: Option<Entity>, _: &dyn Any| {
            counter.set(counter.get() + 1);
            if let Some(entity) = entity {
                debug!(%entity, tags = ?manager.tags_of(entity), "despawning");
            }
        },
    );

    let mut manager = EntityManager::with_settings(settings.manager.clone()).with_messenger(bus);
    for index in 0..settings.entities {
        spawn(&mut manager, index)?;
    }
    info!(entities = manager.count(), "world populated");

    let mut steps = 0;
    let mut draws = 0;
    let mut events_fired = 0;
    let mut frame: Vec<String> = Vec::new();

    for tick in 0..settings.ticks {
        for tag in settings.removals_at(tick) {
            info!(tick, tag, "scheduled removal");
            manager.remove_entities_by_tag(tag)?;
        }

        steps += update_worlds(&mut manager, settings.step_seconds);
        frame.clear();
        draws += draw_all(&mut manager, &mut frame);

        if let Some(bus) = manager.messenger_mut() {
            events_fired += bus.fired();
            bus.reset_counters();
        }
    }

    // tear down so removal events are counted too
    let live = manager.count();
    let pools = manager.pool_stats();
    manager.remove_all_entities()?;
    if let Some(bus) = manager.messenger() {
        events_fired += bus.fired();
    }

    Ok(DemoReport {
        ticks: settings.ticks,
        spawned: settings.entities,
        removed: removed.get(),
        live,
        steps,
        draws,
        events_fired,
        pools,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TaggedRemoval;

    #[test]
    fn test_body_falls_and_stops_at_ground() {
        let mut body = Body {
            height: 1.0,
            velocity: 0.0,
            force: 9.81,
        };
        body.step(1.0);
        assert_eq!(body.height, 1.0);
        body.clear_forces();
        body.step(1.0);
        assert_eq!(body.height, 0.0);
        assert!(body.velocity < 0.0);
    }

    #[test]
    fn test_demo_runs_scheduled_removals() {
        let settings = RuntimeSettings {
            entities: 6,
            ticks: 4,
            tagged_removals: vec![TaggedRemoval {
                tick: 2,
                tag: "debris".into(),
            }],
            ..RuntimeSettings::default()
        };
        let report = run(&settings).unwrap();

        // 0, 2 and 4 are debris
        assert_eq!(report.live, 3);
        assert_eq!(report.removed, 6);
        // two ticks with six bodies, two with three
        assert_eq!(report.steps, 18);
        assert_eq!(report.draws, 18);
        assert_eq!(report.pools.entity.used, 3);
        assert_eq!(report.pools.component("renderable").unwrap().used, 3);
    }

    #[test]
    fn test_demo_without_entities() {
        let settings = RuntimeSettings {
            entities: 0,
            ticks: 3,
            ..RuntimeSettings::default()
        };
        let report = run(&settings).unwrap();
        assert_eq!(report.live, 0);
        assert_eq!(report.steps, 0);
        assert_eq!(report.events_fired, 0);
    }
}
