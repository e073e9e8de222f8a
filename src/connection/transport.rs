//! Where outbound requests go.
//!
//! The dashboard only needs a way to hand a serialized request to whatever
//! owns the socket. [`ChannelSink`] queues lines on a bounded crossbeam
//! channel for a writer thread to drain.

use super::messages::Request;
use crate::error::{DashboardError, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Accepts serialized requests for delivery to the bot.
#[cfg_attr(test, mockall::automock)]
pub trait RequestSink: Send + Sync {
    fn send_json(&self, json: String) -> Result<()>;
}

/// Typed sending on top of [`RequestSink`].
pub trait RequestSinkExt {
    fn send(&self, request: &Request) -> Result<()>;
}

impl<S: RequestSink + ?Sized> RequestSinkExt for S {
    fn send(&self, request: &Request) -> Result<()> {
        self.send_json(request.to_json()?)
    }
}

/// Bounded queue of outbound JSON lines.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<String>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, Receiver<String>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }
}

impl RequestSink for ChannelSink {
    fn send_json(&self, json: String) -> Result<()> {
        self.tx.try_send(json).map_err(|e| match e {
            TrySendError::Full(_) => DashboardError::Channel("outbound queue full".to_string()),
            TrySendError::Disconnected(_) => {
                DashboardError::Channel("outbound queue disconnected".to_string())
            }
        })
    }
}
