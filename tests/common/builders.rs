//! Builders for inbound bot messages

use bot_dashboard::types::GimbalAddr;
use serde_json::{json, Value};

/// `GimbalValue` reading
pub fn gimbal_value(addr: GimbalAddr, value: i64) -> Value {
    json!({"GimbalValue": [{"addr": addr, "value": value}, "Read"]})
}

/// `GimbalControlStatus` with the given drift compensation
pub fn gimbal_status(drift: [f64; 2]) -> Value {
    json!({"GimbalControlStatus": {"drift_compensation": drift, "hold_active": true}})
}

/// Camera object detection report
pub fn object_detection(frame: u64, detector_nsec: u64) -> Value {
    json!({"Command": {"CameraObjectDetection": {
        "frame": frame,
        "detector_nsec": detector_nsec,
        "objects": []
    }}})
}

/// `ConfigIsCurrent` wrapping `config`
pub fn config_is_current(config: Value) -> Value {
    json!({ "ConfigIsCurrent": config })
}

/// A bot configuration with one calibrated winch
pub fn sample_config() -> Value {
    json!({
        "gimbal": {"max_rate": 100, "yaw_gains": [{"p_gain": 1.5}]},
        "winches": [
            {"calibration": {"force_zero_count": 1000.0, "kg_force_per_count": 0.002, "m_dist_per_count": 0.0001}}
        ]
    })
}
