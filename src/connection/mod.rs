//! Connection to the bot
//!
//! [`BotConnection`] owns the aggregated [`BotModel`], the [`EventBus`] that
//! UI-side consumers subscribe to, and the outbound [`RequestSink`].
//!
//! # Flow
//!
//! ```text
//! inbound JSON ──► receive ──► model update ──► pending batch
//!                                 │
//!                                 └─► config event (ConfigIsCurrent)
//!
//! frame() ──► messages event (pending batch) ──► frame event (model)
//! ```

pub mod clock;
pub mod events;
pub mod messages;
pub mod model;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{EventBus, Subscription, Topic};
pub use messages::{Command, Request};
pub use model::{BotModel, MessageBatch, TimestampedMessage};
pub use transport::{ChannelSink, RequestSink, RequestSinkExt};

use crate::error::Result;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a handler panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Live link to one bot.
pub struct BotConnection {
    events: EventBus,
    model: Mutex<Arc<BotModel>>,
    pending: Mutex<Vec<TimestampedMessage>>,
    socket: Arc<dyn RequestSink>,
    clock: Arc<dyn Clock>,
}

impl BotConnection {
    pub fn new(socket: Arc<dyn RequestSink>) -> Self {
        Self::with_clock(socket, Arc::new(SystemClock))
    }

    pub fn with_clock(socket: Arc<dyn RequestSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            events: EventBus::new(),
            model: Mutex::new(Arc::new(BotModel::new())),
            pending: Mutex::new(Vec::new()),
            socket,
            clock,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Snapshot of the current model.
    pub fn model(&self) -> Arc<BotModel> {
        Arc::clone(&lock(&self.model))
    }

    /// Outbound sink, for components that send on their own schedule.
    pub fn socket(&self) -> &Arc<dyn RequestSink> {
        &self.socket
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn send(&self, request: &Request) -> Result<()> {
        self.socket.send(request)
    }

    /// Parse one inbound JSON message and fold it in.
    pub fn receive_json(&self, text: &str) -> Result<()> {
        let value = serde_json::from_str(text)?;
        self.receive(TimestampedMessage::from_wire(value, self.clock.now_millis()));
        Ok(())
    }

    /// Fold one message into the model and queue it for the next frame.
    pub fn receive(&self, message: TimestampedMessage) {
        {
            let mut model = lock(&self.model);
            if let Err(e) = Arc::make_mut(&mut model).update(&message) {
                tracing::warn!("Failed to apply {:?} message: {}", message.variant(), e);
            }
        }

        if message.is_config() {
            tracing::debug!("Configuration received");
            self.events.config.emit(&Arc::new(message.clone()));
        }

        lock(&self.pending).push(message);
    }

    /// Publish one frame: the raw batch first, then the aggregated model.
    ///
    /// The batch is seeded with the current configuration so full-rate
    /// consumers can run calibration-dependent conversions.
    pub fn frame(&self) {
        let messages = std::mem::take(&mut *lock(&self.pending));
        let model = self.model();

        if !messages.is_empty() {
            let batch = Arc::new(MessageBatch::new(model.config_seed(), messages));
            self.events.messages.emit(&batch);
        }
        self.events.frame.emit(&model);
    }

    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }
}
