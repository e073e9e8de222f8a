//! Periodic gimbal parameter polling
//!
//! Each [`PollerToggle`] repeatedly sends one `GimbalValueRequests` command
//! while enabled. A [`PollerBank`] holds the named toggles a dashboard exposes,
//! built from [`PollToggleSpec`] entries in the configuration file.

pub mod toggle;

pub use toggle::{PollerToggle, MIN_POLL_INTERVAL};

use crate::connection::RequestSink;
use crate::error::{DashboardError, Result};
use crate::gimbal;
use crate::types::{PollDescriptor, Scope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Configuration of one named poller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollToggleSpec {
    pub name: String,
    pub interval_ms: u64,
    #[serde(default)]
    pub scope: Scope,
    /// Parameter indices to poll on every target; all parameters when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<u16>>,
    /// Start enabled
    #[serde(default)]
    pub enabled: bool,
}

impl PollToggleSpec {
    pub fn new(name: impl Into<String>, interval_ms: u64, scope: Scope) -> Self {
        Self {
            name: name.into(),
            interval_ms,
            scope,
            indices: None,
            enabled: false,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn descriptors(&self) -> Vec<PollDescriptor> {
        match &self.indices {
            Some(indices) => indices
                .iter()
                .flat_map(|&index| gimbal::parameter_row(index, self.scope))
                .collect(),
            None => gimbal::all_parameters(self.scope),
        }
    }
}

/// Named pollers, in name order.
#[derive(Default)]
pub struct PollerBank {
    toggles: BTreeMap<String, PollerToggle>,
}

impl PollerBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured poller on `runtime`, enabling those marked so.
    pub fn from_specs(specs: &[PollToggleSpec], sink: Arc<dyn RequestSink>, runtime: Handle) -> Self {
        let mut bank = Self::new();
        for spec in specs {
            let mut toggle = PollerToggle::with_runtime(
                runtime.clone(),
                Arc::clone(&sink),
                spec.interval(),
                spec.descriptors(),
            )
            .with_label(spec.name.clone());
            if spec.enabled {
                toggle.set_enabled(true);
            }
            if bank.toggles.insert(spec.name.clone(), toggle).is_some() {
                tracing::warn!("Duplicate poller '{}', keeping the last one", spec.name);
            }
        }
        tracing::info!("Configured {} pollers", bank.len());
        bank
    }

    pub fn insert(&mut self, name: impl Into<String>, toggle: PollerToggle) -> Option<PollerToggle> {
        self.toggles.insert(name.into(), toggle)
    }

    pub fn get(&self, name: &str) -> Option<&PollerToggle> {
        self.toggles.get(name)
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        self.toggles
            .get_mut(name)
            .ok_or_else(|| DashboardError::Config(format!("Unknown poller '{}'", name)))?
            .set_enabled(enabled);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.toggles.keys().map(String::as_str)
    }

    pub fn enabled_count(&self) -> usize {
        self.toggles.values().filter(|t| t.is_enabled()).count()
    }

    pub fn len(&self) -> usize {
        self.toggles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty()
    }

    pub fn teardown_all(&mut self) {
        for toggle in self.toggles.values_mut() {
            toggle.teardown();
        }
    }
}
