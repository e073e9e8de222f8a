//! Mock construction helpers

use bot_dashboard::connection::{BotConnection, ManualClock, RequestSink};
use bot_dashboard::Result;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Sink that records every request it is handed
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn lines(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Recorded requests parsed back into JSON
    pub fn values(&self) -> Vec<Value> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl RequestSink for RecordingSink {
    fn send_json(&self, json: String) -> Result<()> {
        self.sent.lock().unwrap().push(json);
        Ok(())
    }
}

/// Connection on a manual clock, with its recording sink
pub fn test_connection(start_millis: f64) -> (BotConnection, Arc<RecordingSink>, ManualClock) {
    let sink = RecordingSink::new();
    let clock = ManualClock::new(start_millis);
    let connection = BotConnection::with_clock(sink.clone(), Arc::new(clock.clone()));
    (connection, sink, clock)
}
