//! Typed publish/subscribe topics.
//!
//! Each topic carries one payload type. Subscribing returns a
//! [`Subscription`] handle; cancelling it (explicitly or by dropping it)
//! removes the handler. Cancelling twice, or after the topic itself is gone,
//! is a no-op.

use super::lock;
use super::model::{BotModel, MessageBatch, TimestampedMessage};
use std::fmt;
use std::sync::{Arc, Mutex};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

/// A named event stream with strongly typed payloads.
pub struct Topic<T> {
    name: &'static str,
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> Topic<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a handler. Handlers run in subscription order.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = lock(&self.registry);
            registry.next_id += 1;
            let id = registry.next_id;
            registry.handlers.push((id, Arc::new(handler)));
            id
        };
        tracing::trace!(topic = self.name, id, "subscribed");

        let registry = Arc::downgrade(&self.registry);
        Subscription {
            topic: self.name,
            cancel: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    lock(&registry).handlers.retain(|(h, _)| *h != id);
                }
            })),
        }
    }

    /// Deliver `payload` to every current subscriber, returning how many ran.
    ///
    /// The subscriber list is snapshotted first, so handlers may subscribe or
    /// cancel without deadlocking. A handler cancelled mid-dispatch can still
    /// see this one payload; owners guard against that with their own
    /// attached flag.
    pub fn emit(&self, payload: &T) -> usize {
        let handlers: Vec<Handler<T>> = lock(&self.registry)
            .handlers
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).handlers.len()
    }
}

/// Cancellation handle returned by [`Topic::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    topic: &'static str,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Remove the handler. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
            tracing::trace!(topic = self.topic, "unsubscribed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn topic(&self) -> &'static str {
        self.topic
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("active", &self.is_active())
            .finish()
    }
}

/// The events a connection publishes.
pub struct EventBus {
    /// One aggregated model per rendered frame
    pub frame: Topic<Arc<BotModel>>,
    /// Raw messages received since the previous frame
    pub messages: Topic<Arc<MessageBatch>>,
    /// A full configuration snapshot (`ConfigIsCurrent`)
    pub config: Topic<Arc<TimestampedMessage>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            frame: Topic::new("frame"),
            messages: Topic::new("messages"),
            config: Topic::new("config"),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
