use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::model::leave::LeaveRecord;

/// Real-time notice about a leave record, serialised as
/// `{"event": "leaveAdded", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum LeaveEvent {
    LeaveAdded(LeaveRecord),
    LeaveUpdated(LeaveRecord),
    LeaveDeleted { id: u64 },
}

impl LeaveEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LeaveEvent::LeaveAdded(_) => "leaveAdded",
            LeaveEvent::LeaveUpdated(_) => "leaveUpdated",
            LeaveEvent::LeaveDeleted { .. } => "leaveDeleted",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}

/// Outbound hook for leave events. Delivery is best-effort.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: LeaveEvent) -> Result<(), PublishError>;
}

/// In-process fan-out over a bounded broadcast channel. Slow subscribers
/// lose the oldest events.
#[derive(Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<LeaveEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LeaveEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: LeaveEvent) -> Result<(), PublishError> {
        let name = event.name();
        // No subscribers is not an error: nobody is watching.
        match self.sender.send(event) {
            Ok(receivers) => debug!(event = name, receivers, "Leave event published"),
            Err(_) => debug!(event = name, "Leave event dropped, no subscribers"),
        }
        Ok(())
    }
}
