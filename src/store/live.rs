//! Configuration-bound widgets read their values from here.
//!
//! A [`LiveConfig`] tracks the bot's configuration as `ConfigIsCurrent`
//! messages arrive. Widgets that only need the value at the time they were
//! opened (a revert button, say) attach with [`ConfigFollow::Once`].

use super::{lookup, Path};
use crate::connection::{lock, BotConnection, Request, Subscription};
use crate::error::{DashboardError, Result};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// How a [`LiveConfig`] reacts to configuration updates after the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFollow {
    /// Replace the snapshot on every update
    #[default]
    Live,
    /// Keep the first snapshot seen
    Once,
}

/// Local copy of the bot configuration, kept current by the config event.
pub struct LiveConfig {
    snapshot: Arc<Mutex<Option<Value>>>,
    subscription: Subscription,
}

impl LiveConfig {
    /// Seed from the connection's model and subscribe to later updates.
    pub fn attach(connection: &BotConnection, follow: ConfigFollow) -> Self {
        let snapshot = Arc::new(Mutex::new(connection.model().config().cloned()));

        let slot = Arc::clone(&snapshot);
        let subscription = connection.events().config.subscribe(move |message| {
            let Some(config) = message.message.get("ConfigIsCurrent") else {
                return;
            };
            let mut current = lock(&slot);
            if follow == ConfigFollow::Once && current.is_some() {
                return;
            }
            *current = Some(config.clone());
        });

        Self {
            snapshot,
            subscription,
        }
    }

    /// Whether any configuration has been seen yet.
    pub fn is_ready(&self) -> bool {
        lock(&self.snapshot).is_some()
    }

    pub fn current(&self) -> Option<Value> {
        lock(&self.snapshot).clone()
    }

    pub fn get(&self, path: impl Into<Path>) -> Option<Value> {
        let path = path.into();
        lock(&self.snapshot)
            .as_ref()
            .and_then(|config| lookup(config, &path))
            .cloned()
    }

    /// Display text for the value at `path`: strings verbatim, anything else
    /// as compact JSON.
    pub fn text(&self, path: impl Into<Path>) -> Option<String> {
        self.get(path).map(|value| match value {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    /// Update that writes the snapshotted value back to the bot.
    pub fn revert_request(&self, path: impl Into<Path>) -> Result<Request> {
        let path = path.into();
        let value = self
            .get(&path)
            .ok_or_else(|| DashboardError::MissingValue(path.to_string()))?;
        Request::update_config(path, value)
    }

    /// Stop following updates. The current snapshot stays readable.
    pub fn detach(&mut self) {
        self.subscription.cancel();
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_active()
    }
}
