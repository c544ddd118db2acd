use crate::ecs::Entity;
use crate::events::{Callback, ComponentInspector, Subscription, SubscriptionId};
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Named, filterable publish/subscribe channel.
///
/// Callbacks receive `&mut C`, the context that raised the event, so they can
/// call back into it synchronously. When the messenger is owned by that
/// context (as `EntityManager` does) the host drives dispatch itself through
/// [`Messenger::begin`] and [`Messenger::accept`] so the messenger is never
/// borrowed while a callback runs.
pub struct Messenger<C> {
    subscriptions: Vec<Option<Subscription<C>>>,
    by_name: HashMap<String, Vec<SubscriptionId>>,
    fired: u64,
    handled: u64,
}

impl<C> Messenger<C> {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            by_name: HashMap::new(),
            fired: 0,
            handled: 0,
        }
    }

    /// Register `callback` under `event_name`.
    ///
    /// Returns the subscription so filters can be chained onto it.
    pub fn listen_to<F>(
        &mut self,
        event_name: impl Into<String>,
        callback: F,
    ) -> &mut Subscription<C>
    where
        F: Fn(&mut C, Option<Entity>, &dyn Any) + 'static,
    {
        let name = event_name.into();
        let id = SubscriptionId::new(self.subscriptions.len() as u32);
        let callback: Callback<C> = Rc::new(callback);

        self.by_name.entry(name.clone()).or_default().push(id);
        trace!(event = %name, subscription = %id, "listener registered");

        let slot = self.subscriptions.len();
        self.subscriptions.push(None);
        self.subscriptions[slot].insert(Subscription::new(id, name, callback))
    }

    pub fn subscription(&self, id: SubscriptionId) -> Option<&Subscription<C>> {
        self.subscriptions.get(id.index() as usize)?.as_ref()
    }

    pub fn subscription_mut(&mut self, id: SubscriptionId) -> Option<&mut Subscription<C>> {
        self.subscriptions.get_mut(id.index() as usize)?.as_mut()
    }

    /// Drop a listener. Returns false if it was already gone.
    pub fn stop_listening(&mut self, id: SubscriptionId) -> bool {
        let Some(subscription) = self
            .subscriptions
            .get_mut(id.index() as usize)
            .and_then(Option::take)
        else {
            return false;
        };

        if let Some(ids) = self.by_name.get_mut(subscription.name()) {
            ids.retain(|&other| other != id);
        }
        true
    }

    /// Number of active listeners across all event names.
    pub fn subscription_count(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    /// Events triggered since the last reset.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Callback invocations since the last reset.
    pub fn handled(&self) -> u64 {
        self.handled
    }

    /// Zero the counters. Call once per tick for per-tick numbers.
    pub fn reset_counters(&mut self) {
        self.fired = 0;
        self.handled = 0;
    }

    /// Start dispatching `event_name`: counts the event and returns the
    /// listeners registered for it, in registration order.
    pub fn begin(&mut self, event_name: &str) -> Vec<SubscriptionId> {
        self.fired += 1;
        self.by_name.get(event_name).cloned().unwrap_or_default()
    }

    /// Test one listener against the event. On a match the handled counter is
    /// bumped and the callback is returned for the host to invoke.
    pub fn accept(
        &mut self,
        id: SubscriptionId,
        event_name: &str,
        entity: Option<Entity>,
        inspector: &dyn ComponentInspector,
    ) -> Option<Callback<C>> {
        let subscription = self.subscription(id)?;
        if !subscription.matches(event_name, entity, inspector) {
            return None;
        }
        let callback = subscription.callback();
        self.handled += 1;
        Some(callback)
    }

    /// Dispatch `event_name` to every matching listener with `ctx`.
    ///
    /// Use this when the messenger lives outside `ctx`.
    pub fn trigger(
        &mut self,
        ctx: &mut C,
        event_name: &str,
        entity: Option<Entity>,
        payload: &dyn Any,
    ) where
        C: ComponentInspector,
    {
        for id in self.begin(event_name) {
            if let Some(callback) = self.accept(id, event_name, entity, &*ctx) {
                callback(ctx, entity, payload);
            }
        }
    }
}

impl<C> Default for Messenger<C> {
    fn default() -> Self {
        Self::new()
    }
}
