//! Outbound requests.
//!
//! Requests serialize to the externally tagged JSON the bot expects, e.g.
//! `{"UpdateConfig": {...}}` or
//! `{"Command": {"GimbalValueRequests": [...]}}`.

use crate::error::Result;
use crate::store::{self, Path};
use crate::types::{GimbalAddr, PollDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request sent to the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    /// Merge a partial configuration tree into the bot's configuration
    UpdateConfig(Value),
    Command(Command),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Ask the gimbal to report the listed parameters
    GimbalValueRequests(Vec<PollDescriptor>),
    GimbalValueWrite { addr: GimbalAddr, value: i32 },
}

impl Request {
    /// Configuration update setting `value` at `path`.
    pub fn update_config(path: impl Into<Path>, value: Value) -> Result<Self> {
        Ok(Request::UpdateConfig(store::partial(path, value)?))
    }

    /// Configuration update from a text value, sent as a number when the text
    /// reads as one.
    pub fn update_config_text(path: impl Into<Path>, text: &str) -> Result<Self> {
        Self::update_config(path, number_or_text(text))
    }

    pub fn poll(descriptors: &[PollDescriptor]) -> Self {
        Request::Command(Command::GimbalValueRequests(descriptors.to_vec()))
    }

    pub fn gimbal_write(addr: GimbalAddr, value: i32) -> Self {
        Request::Command(Command::GimbalValueWrite { addr, value })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Interpret text as a number if it has a numeric prefix, else keep it.
///
/// Integral values become JSON integers so `"2"` is sent as `2`, not `2.0`.
pub fn number_or_text(text: &str) -> Value {
    match leading_number(text) {
        Some(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Value::from(n as i64),
        Some(n) => Value::from(n),
        None => Value::String(text.to_string()),
    }
}

/// Longest prefix of `text` (after leading whitespace) that parses as a
/// finite float.
fn leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        if c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E') {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    (1..=end)
        .rev()
        .filter(|&len| trimmed.is_char_boundary(len))
        .find_map(|len| trimmed[..len].parse::<f64>().ok())
        .filter(|n| n.is_finite())
}
