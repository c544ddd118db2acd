use std::any::Any;
use std::rc::Rc;
use tiny_ecs_core::ecs::{Component, EntityManager};
use tracing::trace;

/// Draw callback: the caller's render context plus the component's params.
pub type DrawFn = Rc<dyn Fn(&mut dyn Any, Option<&dyn Any>)>;

/// Something the render pass can draw.
///
/// Both fields are opaque to the store; the render context decides what they
/// mean.
#[derive(Default)]
pub struct Renderable {
    pub draw: Option<DrawFn>,
    pub params: Option<Box<dyn Any>>,
}

impl Renderable {
    pub fn new(draw: DrawFn, params: impl Any) -> Self {
        Self {
            draw: Some(draw),
            params: Some(Box::new(params)),
        }
    }
}

tiny_ecs_core::poolable_by_default!(Renderable);
tiny_ecs_core::define_component!(Renderable, 100, "Renderable");

/// Invoke the draw callback of every entity owning a `Renderable`, in group
/// order. Returns the number of callbacks run.
pub fn draw_all(manager: &mut EntityManager, ctx: &mut dyn Any) -> usize {
    let key = manager.index_group(&[Renderable::ID]);
    let mut drawn = 0;
    for &entity in manager.group(&key) {
        let Some(renderable) = manager.get_component::<Renderable>(entity) else {
            continue;
        };
        let Some(draw) = renderable.draw.as_ref() else {
            continue;
        };
        draw(&mut *ctx, renderable.params.as_deref());
        drawn += 1;
    }
    trace!(drawn, "render pass");
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_label() -> DrawFn {
        Rc::new(|ctx: &mut dyn Any, params: Option<&dyn Any>| {
            let Some(frame) = ctx.downcast_mut::<Vec<String>>() else {
                return;
            };
            let label = params
                .and_then(|p| p.downcast_ref::<&str>())
                .copied()
                .unwrap_or("?");
            frame.push(label.to_string());
        })
    }

    #[test]
    fn test_draws_every_renderable_with_its_params() {
        let mut manager = EntityManager::new();
        let a = manager.create_entity();
        let b = manager.create_entity();
        let plain = manager.create_entity();
        manager
            .add_component_with::<Renderable, _>(a, |r: &mut Renderable| {
                *r = Renderable::new(log_label(), "ship")
            })
            .unwrap();
        manager
            .add_component_with::<Renderable, _>(b, |r: &mut Renderable| {
                *r = Renderable::new(log_label(), "rock")
            })
            .unwrap();
        // attached but never configured
        manager.add_component::<Renderable>(plain).unwrap();

        let mut frame: Vec<String> = Vec::new();
        assert_eq!(draw_all(&mut manager, &mut frame), 2);
        assert_eq!(frame, ["ship", "rock"]);

        manager.remove_entity(a).unwrap();
        frame.clear();
        assert_eq!(draw_all(&mut manager, &mut frame), 1);
        assert_eq!(frame, ["rock"]);
    }

    #[test]
    fn test_recycled_renderable_is_cleared() {
        let mut manager = EntityManager::new();
        let e = manager.create_entity();
        manager
            .add_component_with::<Renderable, _>(e, |r: &mut Renderable| {
                *r = Renderable::new(log_label(), "x")
            })
            .unwrap();
        manager.remove_component::<Renderable>(e).unwrap();
        manager.add_component::<Renderable>(e).unwrap();

        let renderable = manager.get_component::<Renderable>(e).unwrap();
        assert!(renderable.draw.is_none());
        assert!(renderable.params.is_none());
    }
}
