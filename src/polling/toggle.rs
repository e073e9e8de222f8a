//! A switchable periodic poller.

use crate::connection::{lock, Request, RequestSink, RequestSinkExt};
use crate::error::{DashboardError, Result};
use crate::types::PollDescriptor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Shortest interval a poller will run at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct PollerState {
    enabled: bool,
    interval: Duration,
    descriptors: Arc<[PollDescriptor]>,
    /// Bumped on every re-arm and on teardown. A timer only fires while its
    /// generation is current.
    generation: u64,
    torn_down: bool,
    sent: u64,
}

/// Sends the same `GimbalValueRequests` command every `interval` while
/// enabled.
///
/// The first request goes out one full interval after enabling. Disabling,
/// reconfiguring or dropping the toggle cancels the pending timer; a timer
/// that was already due when that happened does not send.
pub struct PollerToggle {
    label: String,
    shared: Arc<Mutex<PollerState>>,
    sink: Arc<dyn RequestSink>,
    runtime: Handle,
    timer: Option<JoinHandle<()>>,
}

impl PollerToggle {
    /// Create a disabled toggle on the current tokio runtime.
    pub fn new(
        sink: Arc<dyn RequestSink>,
        interval: Duration,
        descriptors: Vec<PollDescriptor>,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| DashboardError::Runtime(e.to_string()))?;
        Ok(Self::with_runtime(runtime, sink, interval, descriptors))
    }

    pub fn with_runtime(
        runtime: Handle,
        sink: Arc<dyn RequestSink>,
        interval: Duration,
        descriptors: Vec<PollDescriptor>,
    ) -> Self {
        Self {
            label: String::from("poller"),
            shared: Arc::new(Mutex::new(PollerState {
                enabled: false,
                interval: interval.max(MIN_POLL_INTERVAL),
                descriptors: descriptors.into(),
                generation: 0,
                torn_down: false,
                sent: 0,
            })),
            sink,
            runtime,
            timer: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.shared).enabled
    }

    /// Whether a timer task is currently scheduled
    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn interval(&self) -> Duration {
        lock(&self.shared).interval
    }

    pub fn descriptors(&self) -> Arc<[PollDescriptor]> {
        Arc::clone(&lock(&self.shared).descriptors)
    }

    /// Requests successfully handed to the sink so far
    pub fn requests_sent(&self) -> u64 {
        lock(&self.shared).sent
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        {
            let mut state = lock(&self.shared);
            if state.torn_down || state.enabled == enabled {
                return;
            }
            state.enabled = enabled;
        }
        tracing::debug!(poller = %self.label, enabled, "Poller toggled");
        self.rearm();
    }

    pub fn toggle(&mut self) {
        let enabled = self.is_enabled();
        self.set_enabled(!enabled);
    }

    /// Change interval and descriptors. A running poller restarts its
    /// countdown.
    pub fn reconfigure(&mut self, interval: Duration, descriptors: Vec<PollDescriptor>) {
        {
            let mut state = lock(&self.shared);
            if state.torn_down {
                return;
            }
            state.interval = interval.max(MIN_POLL_INTERVAL);
            state.descriptors = descriptors.into();
        }
        self.rearm();
    }

    pub fn set_interval(&mut self, interval: Duration) {
        let descriptors = self.descriptors().to_vec();
        self.reconfigure(interval, descriptors);
    }

    /// Cancel any pending timer for good. Later calls are ignored.
    pub fn teardown(&mut self) {
        {
            let mut state = lock(&self.shared);
            if state.torn_down {
                return;
            }
            state.torn_down = true;
            state.enabled = false;
            state.generation += 1;
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        tracing::debug!(poller = %self.label, "Poller torn down");
    }

    fn rearm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let generation = {
            let mut state = lock(&self.shared);
            state.generation += 1;
            if !state.enabled || state.torn_down {
                return;
            }
            state.generation
        };

        let shared = Arc::clone(&self.shared);
        let sink = Arc::clone(&self.sink);
        let label = self.label.clone();
        self.timer = Some(self.runtime.spawn(async move {
            loop {
                let Some(interval) = current_interval(&shared, generation) else {
                    return;
                };
                tokio::time::sleep(interval).await;
                if !fire(&shared, sink.as_ref(), generation, &label) {
                    return;
                }
            }
        }));
    }
}

impl Drop for PollerToggle {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn current_interval(shared: &Mutex<PollerState>, generation: u64) -> Option<Duration> {
    let state = lock(shared);
    (state.generation == generation).then_some(state.interval)
}

/// Send one request if this timer is still current. Returns `false` once the
/// timer should stop.
fn fire(shared: &Mutex<PollerState>, sink: &dyn RequestSink, generation: u64, label: &str) -> bool {
    let mut state = lock(shared);
    if state.generation != generation || !state.enabled {
        return false;
    }
    match sink.send(&Request::poll(&state.descriptors)) {
        Ok(()) => state.sent += 1,
        Err(e) => tracing::warn!(poller = %label, "Poll request not sent: {}", e),
    }
    true
}
