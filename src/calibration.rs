//! Winch sensor unit conversion using calibration from the bot configuration.
//!
//! Calibration lives at `winches.<id>.calibration` in the current
//! configuration. Without a configuration the conversions return `None`,
//! which chart extractors treat as "no data yet".

use crate::connection::BotModel;
use crate::path;
use crate::store;
use serde_json::Value;

fn calibration(model: &BotModel, winch: usize) -> Option<&Value> {
    store::get(model.config()?, path!["winches", winch, "calibration"])
}

fn field(calibration: &Value, name: &str) -> Option<f64> {
    calibration.get(name)?.as_f64()
}

/// Raw force sensor counts to kilograms.
pub fn force_to_kg(model: &BotModel, winch: usize, counts: f64) -> Option<f64> {
    let cal = calibration(model, winch)?;
    Some((counts - field(cal, "force_zero_count")?) * field(cal, "kg_force_per_count")?)
}

/// Raw encoder counts to meters.
pub fn dist_to_meters(model: &BotModel, winch: usize, counts: f64) -> Option<f64> {
    let cal = calibration(model, winch)?;
    Some(counts * field(cal, "m_dist_per_count")?)
}
