use std::collections::HashMap;

use liveboard_core::types::ConnId;
use liveboard_protocol::{frames::EventFrame, LiveEvent};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Fan-out of serialized event frames to every registered subscriber.
///
/// Delivery is `try_send` only: a full queue drops the frame for that one
/// subscriber, a closed queue unregisters it. Nothing here ever waits on a
/// subscriber.
#[derive(Default)]
pub struct Subscribers {
    clients: HashMap<ConnId, mpsc::Sender<String>>,
    seq: u64,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, conn_id: ConnId, tx: mpsc::Sender<String>) {
        self.clients.insert(conn_id, tx);
    }

    /// Returns whether the subscriber was registered. Removing twice is fine.
    pub fn remove(&mut self, conn_id: &ConnId) -> bool {
        self.clients.remove(conn_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains(&self, conn_id: &ConnId) -> bool {
        self.clients.contains_key(conn_id)
    }

    /// Push `event` to every subscriber. Returns how many accepted it.
    pub fn publish(&mut self, event: &LiveEvent) -> usize {
        let frame = EventFrame::from_live(event).with_seq(self.seq);
        self.seq += 1;
        let Some(payload) = encode(event, &frame) else {
            return 0;
        };

        let mut delivered = 0;
        let mut gone = Vec::new();
        for (conn_id, tx) in &self.clients {
            match tx.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(conn_id = %conn_id, event = event.name(), "subscriber queue full, event dropped");
                }
                Err(TrySendError::Closed(_)) => gone.push(conn_id.clone()),
            }
        }
        for conn_id in gone {
            debug!(conn_id = %conn_id, "subscriber channel closed, unregistering");
            self.clients.remove(&conn_id);
        }
        delivered
    }

    /// Push `event` to one subscriber only. The frame carries no `seq`, so
    /// the broadcast sequence stays gap-free for everyone else.
    pub fn send_to(&mut self, conn_id: &ConnId, event: &LiveEvent) -> bool {
        let Some(payload) = encode(event, &EventFrame::from_live(event)) else {
            return false;
        };
        let Some(tx) = self.clients.get(conn_id) else {
            return false;
        };
        match tx.try_send(payload) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Closed(_)) => {
                self.clients.remove(conn_id);
                false
            }
        }
    }

}

/// Serialize once per event.
fn encode(event: &LiveEvent, frame: &EventFrame) -> Option<String> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(event = event.name(), error = %e, "event serialization failed");
            None
        }
    }
}
