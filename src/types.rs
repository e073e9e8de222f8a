//! Core data types shared across the dashboard
//!
//! # Main Types
//!
//! - [`TimePoint`] - A single chart sample (milliseconds, value)
//! - [`GimbalAddr`] - Address of a gimbal firmware parameter
//! - [`Scope`] - Whether a poll asks for one reading or a stream
//! - [`PollDescriptor`] - One entry of a `GimbalValueRequests` command

use serde::{Deserialize, Serialize};

/// Shift applied to every appended point so the newest sample never sits
/// flush against the live edge of a scrolling chart.
pub const TIME_MARGIN_MILLIS: f64 = 50.0;

/// Maximum number of points retained per series buffer
pub const MAX_SERIES_POINTS: usize = 10_000;

/// Number of firmware parameter indices exposed by the gimbal
pub const GIMBAL_PARAM_COUNT: u16 = 0x80;

/// Number of targets (motor controllers) per gimbal parameter index
pub const GIMBAL_TARGET_COUNT: u8 = 3;

/// One sample in a chart series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePoint {
    /// Milliseconds on the dashboard clock
    pub timestamp_millis: f64,
    pub value: f64,
}

impl TimePoint {
    pub fn new(timestamp_millis: f64, value: f64) -> Self {
        Self {
            timestamp_millis,
            value,
        }
    }
}

/// Address of a gimbal firmware parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GimbalAddr {
    pub index: u16,
    pub target: u8,
}

impl GimbalAddr {
    pub fn new(index: u16, target: u8) -> Self {
        Self { index, target }
    }
}

impl std::fmt::Display for GimbalAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02x}/{}", self.index, self.target)
    }
}

/// Whether a poll request asks for a single reading or a stream of updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Scope {
    #[default]
    Once,
    Continuous,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Once => write!(f, "Once"),
            Scope::Continuous => write!(f, "Continuous"),
        }
    }
}

/// A single parameter read request, passed verbatim to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PollDescriptor {
    pub addr: GimbalAddr,
    pub scope: Scope,
}

impl PollDescriptor {
    pub fn new(index: u16, target: u8, scope: Scope) -> Self {
        Self {
            addr: GimbalAddr::new(index, target),
            scope,
        }
    }
}
