//! The aggregated bot model.
//!
//! Every inbound message is routed to a slot in one JSON tree, so the model
//! always holds the latest message of each kind. Charts read from this tree
//! through path lookups; a message that has not arrived yet simply leaves its
//! slot empty.

use crate::error::Result;
use crate::path;
use crate::store::{self, Path, Segment};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// An inbound message tagged with the dashboard clock at receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedMessage {
    /// Milliseconds on the dashboard clock
    pub local_timestamp: f64,
    pub message: Value,
}

impl TimestampedMessage {
    pub fn new(local_timestamp: f64, message: Value) -> Self {
        Self {
            local_timestamp,
            message,
        }
    }

    /// Accept either a bare message or an envelope with a `message` field.
    ///
    /// The envelope's own timestamp is ignored; receipt time is what charts
    /// align against.
    pub fn from_wire(value: Value, received_at: f64) -> Self {
        let message = match value {
            Value::Object(mut map) if map.len() > 1 && map.contains_key("message") => {
                map.remove("message").unwrap_or(Value::Null)
            }
            other => other,
        };
        Self::new(received_at, message)
    }

    /// Name of the message variant (`"GimbalValue"`, `"Command"`, ...)
    pub fn variant(&self) -> Option<&str> {
        variant_of(&self.message).map(|(name, _)| name)
    }

    pub fn is_config(&self) -> bool {
        self.variant() == Some("ConfigIsCurrent")
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("local_timestamp".into(), Value::from(self.local_timestamp));
        map.insert("message".into(), self.message.clone());
        Value::Object(map)
    }
}

static UNIT_BODY: Value = Value::Null;

/// Externally tagged variant name and body.
///
/// Unit variants arrive as a bare string and have a null body.
fn variant_of(message: &Value) -> Option<(&str, &Value)> {
    match message {
        Value::Object(map) if map.len() == 1 => map.iter().next().map(|(k, v)| (k.as_str(), v)),
        Value::String(name) => Some((name.as_str(), &UNIT_BODY)),
        _ => None,
    }
}

/// Model slot a message is stored under, or `None` for unroutable input.
pub fn route(message: &Value) -> Option<Path> {
    let (variant, body) = variant_of(message)?;
    let slot = match variant {
        "GimbalValue" => {
            let addr = body.get(0)?.get("addr")?;
            let index = addr.get("index")?.as_u64()?;
            let target = addr.get("target")?.as_u64()?;
            path!["gimbal_values", index, target]
        }
        "GimbalControlStatus" => path!["gimbal_status"],
        "ConfigIsCurrent" => path!["config"],
        "FlyerSensors" => path!["flyer_sensors"],
        "WinchStatus" => {
            let id = body.get(0)?.as_u64()?;
            path!["winches", id]
        }
        "Command" => match variant_of(body)?.0 {
            "CameraObjectDetection" => path!["camera", "object_detection"],
            "CameraRegionTracking" => path!["camera", "region_tracking"],
            other => Path::root()
                .join(Segment::Key("command".into()))
                .join(Segment::Key(other.to_string())),
        },
        other => Path::root().join(Segment::Key(other.to_string())),
    };
    Some(slot)
}

/// Latest message of each kind, keyed by routing slot.
#[derive(Debug, Clone, PartialEq)]
pub struct BotModel {
    root: Value,
}

impl Default for BotModel {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl BotModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn get(&self, path: impl Into<Path>) -> Option<&Value> {
        self.lookup(&path.into())
    }

    pub fn lookup(&self, path: &Path) -> Option<&Value> {
        store::lookup(&self.root, path)
    }

    /// Current configuration tree (the body of the last `ConfigIsCurrent`).
    pub fn config(&self) -> Option<&Value> {
        self.get(path!["config", "message", "ConfigIsCurrent"])
    }

    /// A model holding only this model's configuration slot.
    ///
    /// Replaying raw messages starts from here so converters that need
    /// calibration data still find it.
    pub fn config_seed(&self) -> BotModel {
        let mut seed = BotModel::new();
        if let (Some(config), Value::Object(map)) = (self.root.get("config"), &mut seed.root) {
            map.insert("config".into(), config.clone());
        }
        seed
    }

    /// Fold one message into the model.
    ///
    /// Returns `false` when the message has no recognizable variant and was
    /// ignored.
    pub fn update(&mut self, message: &TimestampedMessage) -> Result<bool> {
        let Some(slot) = route(&message.message) else {
            tracing::debug!("Ignoring unroutable message");
            return Ok(false);
        };
        store::assign(&mut self.root, &slot, message.to_value())?;
        Ok(true)
    }

    /// Models after each successive message, starting from `seed`.
    pub fn scan(seed: &BotModel, messages: &[TimestampedMessage]) -> Vec<BotModel> {
        let mut model = seed.clone();
        messages
            .iter()
            .map(|message| {
                if let Err(e) = model.update(message) {
                    tracing::debug!("Skipping message during replay: {}", e);
                }
                model.clone()
            })
            .collect()
    }
}

/// Messages received since the previous frame, with the model to replay from.
#[derive(Debug)]
pub struct MessageBatch {
    pub seed: BotModel,
    pub messages: Vec<TimestampedMessage>,
    models: OnceLock<Vec<BotModel>>,
}

impl MessageBatch {
    pub fn new(seed: BotModel, messages: Vec<TimestampedMessage>) -> Self {
        Self {
            seed,
            messages,
            models: OnceLock::new(),
        }
    }

    /// Per-message models, computed once and shared by every subscriber.
    pub fn models(&self) -> &[BotModel] {
        self.models
            .get_or_init(|| BotModel::scan(&self.seed, &self.messages))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
