use async_trait::async_trait;
use meshroom_core::{ChatMessage, ParticipantId, ParticipantRecord, RoomId, SignalEnvelope, WaitingEntry};
use tokio::sync::mpsc;

use crate::error::StoreError;

/// Row-level change notifications for one room.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    MessageInserted(ChatMessage),
    ParticipantInserted(ParticipantRecord),
    ParticipantDeleted(ParticipantId),
    SignalInserted(SignalEnvelope),
    WaitingInserted(WaitingEntry),
    WaitingDeleted(ParticipantId),
}

/// A live feed of [`ChangeEvent`]s for a room. Dropping or closing it
/// unsubscribes.
pub struct Subscription {
    room_id: RoomId,
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl Subscription {
    pub fn new(room_id: RoomId, rx: mpsc::UnboundedReceiver<ChangeEvent>) -> Self {
        Self { room_id, rx }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Next already-delivered event, without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    pub fn close(mut self) {
        self.rx.close();
    }
}

#[async_trait]
pub trait Realtime: Send + Sync {
    async fn subscribe(&self, room_id: RoomId) -> Result<Subscription, StoreError>;
}
