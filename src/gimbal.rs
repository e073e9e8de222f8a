//! Gimbal firmware parameters
//!
//! The gimbal exposes `0x80` parameter indices on each of three targets.
//! Readings arrive as `GimbalValue` messages and land in the model at
//! `gimbal_values.<index>.<target>`.

use crate::chart::{number_at, Extractors};
use crate::connection::{BotModel, Request};
use crate::path;
use crate::polling::PollToggleSpec;
use crate::store::Path;
use crate::types::{GimbalAddr, PollDescriptor, Scope, GIMBAL_PARAM_COUNT, GIMBAL_TARGET_COUNT};
use serde_json::Value;

/// Age at which a readout has faded to its minimum opacity.
pub const FADE_MILLIS: f64 = 500.0;
/// Opacity of a stale readout
pub const MIN_OPACITY: f64 = 0.5;

/// Op status shown before any reading has been seen
pub const UNREAD_OP: &str = "unread";

/// Every parameter on every target.
pub fn all_parameters(scope: Scope) -> Vec<PollDescriptor> {
    (0..GIMBAL_PARAM_COUNT)
        .flat_map(|index| parameter_row(index, scope))
        .collect()
}

/// One parameter index on every target.
pub fn parameter_row(index: u16, scope: Scope) -> Vec<PollDescriptor> {
    (0..GIMBAL_TARGET_COUNT)
        .map(|target| PollDescriptor::new(index, target, scope))
        .collect()
}

/// The per-row pollers offered next to each parameter.
pub fn row_toggles(index: u16) -> Vec<PollToggleSpec> {
    [
        ("cont", 300, Scope::Continuous),
        ("100ms", 100, Scope::Once),
        ("1s", 1000, Scope::Once),
    ]
    .into_iter()
    .map(|(suffix, interval_ms, scope)| PollToggleSpec {
        indices: Some(vec![index]),
        ..PollToggleSpec::new(format!("{:02x}_{}", index, suffix), interval_ms, scope)
    })
    .collect()
}

/// The two global pollers covering the whole parameter table.
pub fn global_toggles() -> Vec<PollToggleSpec> {
    vec![
        PollToggleSpec::new("all_1s", 1000, Scope::Once),
        PollToggleSpec::new("all_10s", 10_000, Scope::Once),
    ]
}

/// One-shot read of the whole table, sent when the dashboard starts so every
/// readout has a value before any poller is enabled.
pub fn request_all() -> Request {
    Request::poll(&all_parameters(Scope::Once))
}

fn cell_path(addr: GimbalAddr) -> Path {
    path!["gimbal_values", addr.index, addr.target]
}

/// Path of the latest value of a parameter in the model
pub fn value_path(addr: GimbalAddr) -> Path {
    cell_path(addr)
        .join("message")
        .join("GimbalValue")
        .join(0)
        .join("value")
}

/// Path of the receipt time of the latest reading
pub fn timestamp_path(addr: GimbalAddr) -> Path {
    cell_path(addr).join("local_timestamp")
}

/// Latest value of a parameter, if it has been read.
pub fn current_value(model: &BotModel, addr: GimbalAddr) -> Option<f64> {
    model.lookup(&value_path(addr))?.as_f64()
}

/// Chart one parameter, with a new point for every fresh reading.
pub fn series_extractors(addr: GimbalAddr) -> Extractors {
    Extractors::new(
        number_at(value_path(addr)),
        number_at(timestamp_path(addr)),
        crate::chart::value_at(timestamp_path(addr)),
    )
}

/// Display state of one parameter cell.
///
/// Recent readings are drawn at full opacity and fade as they age. A cell is
/// flagged dynamic once a later reading differs from an earlier one.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamReadout {
    pub addr: GimbalAddr,
    pub opacity: f64,
    pub op: String,
    pub value: Option<Value>,
    pub dynamic: bool,
}

impl ParamReadout {
    pub fn new(addr: GimbalAddr) -> Self {
        Self {
            addr,
            opacity: MIN_OPACITY,
            op: UNREAD_OP.to_string(),
            value: None,
            dynamic: false,
        }
    }

    /// Refresh from the model at `now_ms`. Returns `false` if the parameter
    /// has never been read.
    pub fn observe(&mut self, model: &BotModel, now_ms: f64) -> bool {
        let Some(cell) = model.lookup(&cell_path(self.addr)) else {
            return false;
        };
        let Some(reading) = cell.get("message").and_then(|m| m.get("GimbalValue")) else {
            return false;
        };
        let timestamp = cell
            .get("local_timestamp")
            .and_then(Value::as_f64)
            .unwrap_or(now_ms);

        let value = reading.get(0).and_then(|r| r.get("value")).cloned();
        let op = match reading.get(1) {
            Some(Value::String(op)) => op.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let age = now_ms - timestamp;
        self.opacity = (1.0 - age / FADE_MILLIS).max(MIN_OPACITY);
        if self.op != UNREAD_OP && self.value != value {
            self.dynamic = true;
        }
        self.op = op;
        self.value = value;
        true
    }

    /// Value text for display
    pub fn text(&self) -> String {
        match &self.value {
            Some(Value::String(s)) => s.clone(),
            Some(v) => v.to_string(),
            None => String::new(),
        }
    }
}
