use tiny_ecs_core::ecs::{Component, EntityManager};
use tracing::trace;

/// Opaque simulation driven once per tick.
pub trait Simulation {
    fn step(&mut self, dt: f32);

    fn clear_forces(&mut self);
}

/// Owns one simulation handle.
#[derive(Default)]
pub struct PhysicsWorld {
    pub simulation: Option<Box<dyn Simulation>>,
}

impl PhysicsWorld {
    pub fn new(simulation: impl Simulation + 'static) -> Self {
        Self {
            simulation: Some(Box::new(simulation)),
        }
    }
}

tiny_ecs_core::poolable_by_default!(PhysicsWorld);
tiny_ecs_core::define_component!(PhysicsWorld, 101, "PhysicsWorld");

/// Step every `PhysicsWorld` by `dt`, then clear its accumulated forces.
/// Returns the number of simulations stepped.
pub fn update_worlds(manager: &mut EntityManager, dt: f32) -> usize {
    let worlds = manager.query_components(&[PhysicsWorld::ID]).to_vec();
    let mut stepped = 0;
    for entity in worlds {
        let Some(world) = manager.get_component_mut::<PhysicsWorld>(entity) else {
            continue;
        };
        if let Some(simulation) = world.simulation.as_mut() {
            simulation.step(dt);
            simulation.clear_forces();
            stepped += 1;
        }
    }
    trace!(stepped, dt, "physics pass");
    stepped
}
