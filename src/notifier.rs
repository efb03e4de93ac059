//! Best-effort event fan-out to observers.
//!
//! The harness publishes a tagged event for every status transition, job
//! log line, and completed exchange. Delivery is fire-and-forget over a
//! broadcast channel: publishing never blocks, never fails the caller, and
//! an observer that falls behind loses the oldest events rather than
//! applying backpressure to the core.

use crate::types::LinkStatus;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 64;

/// A tagged notification event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    /// A target's connection changed liveness state.
    StatusChanged { target_id: u64, status: LinkStatus },
    /// A diagnostic line tied to a target, e.g. a failed repeat tick.
    Log { target_id: u64, message: String },
    /// One completed request/response exchange.
    Response {
        target_id: u64,
        packet_id: u64,
        packet_name: String,
        packet_desc: String,
        request_hex: String,
        response_hex: String,
    },
}

/// Handle for publishing and subscribing to harness events.
///
/// Cloning is cheap; all clones share one channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Event>,
}

impl Notifier {
    /// Create a notifier buffering up to `capacity` undelivered events per
    /// subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped silently.
    pub fn publish(&self, event: Event) {
        if self.tx.send(event).is_err() {
            trace!("event dropped, no subscribers");
        }
    }

    /// Subscribe to events published after this call.
    ///
    /// Slow subscribers skip over events they missed instead of stalling
    /// the publishers.
    pub fn subscribe(&self) -> impl Stream<Item = Event> + 'static {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|result| async move { result.ok() })
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
