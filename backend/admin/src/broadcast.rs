//! Fire-and-forget fan-out of purchase events to WebSocket subscribers.
//!
//! Delivery is at-most-once with no replay. A subscriber that falls more than
//! [`CHANNEL_CAPACITY`] events behind skips the ones it missed.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::models::Purchase;

pub const CHANNEL_CAPACITY: usize = 256;

/// Wire shape: `{"event":"new-purchase","data":{...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum PurchaseEvent {
    NewPurchase(Purchase),
}

#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<PurchaseEvent>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Broadcaster { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PurchaseEvent> {
        self.tx.subscribe()
    }

    /// Publish to whoever is listening; returns the number of receivers.
    pub fn publish(&self, event: PurchaseEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("no websocket subscribers, event dropped");
                0
            }
        }
    }
}
