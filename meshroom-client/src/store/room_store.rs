use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meshroom_core::{
    ChatMessage, ParticipantId, ParticipantRecord, Room, RoomId, Session, SessionStatus,
    SignalEnvelope, WaitingEntry,
};

use crate::error::StoreError;
use crate::store::Realtime;

/// Durable room state: rooms, presence, chat, signaling rows, the waiting
/// roster and discussion sessions.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn find_room_by_code(&self, room_code: &str) -> Result<Option<Room>, StoreError>;

    /// Fails with [`StoreError::Conflict`] if the code is taken.
    async fn create_room(&self, room_code: &str, name: &str) -> Result<Room, StoreError>;

    /// Inserts or refreshes a presence row. A refreshed row keeps its join order.
    async fn upsert_participant(
        &self,
        room_id: RoomId,
        participant_id: &ParticipantId,
        display_name: &str,
    ) -> Result<ParticipantRecord, StoreError>;

    /// Returns whether a row was deleted.
    async fn remove_participant(
        &self,
        room_id: RoomId,
        participant_id: &ParticipantId,
    ) -> Result<bool, StoreError>;

    /// Presence rows in join order.
    async fn list_participants(&self, room_id: RoomId)
    -> Result<Vec<ParticipantRecord>, StoreError>;

    async fn insert_message(
        &self,
        room_id: RoomId,
        sender_name: &str,
        content: &str,
    ) -> Result<ChatMessage, StoreError>;

    /// Chat history, oldest first.
    async fn list_messages(&self, room_id: RoomId) -> Result<Vec<ChatMessage>, StoreError>;

    async fn insert_signal(&self, envelope: SignalEnvelope) -> Result<(), StoreError>;

    async fn upsert_waiting(
        &self,
        room_id: RoomId,
        participant_id: &ParticipantId,
        display_name: &str,
    ) -> Result<WaitingEntry, StoreError>;

    async fn remove_waiting(
        &self,
        room_id: RoomId,
        participant_id: &ParticipantId,
    ) -> Result<bool, StoreError>;

    async fn list_waiting(&self, room_id: RoomId) -> Result<Vec<WaitingEntry>, StoreError>;

    /// First writer wins; later attempts get [`StoreError::Conflict`].
    async fn create_session(
        &self,
        room_id: RoomId,
        started_at: DateTime<Utc>,
    ) -> Result<Session, StoreError>;

    async fn get_session(&self, room_id: RoomId) -> Result<Option<Session>, StoreError>;

    async fn set_session_status(
        &self,
        room_id: RoomId,
        status: SessionStatus,
    ) -> Result<(), StoreError>;
}

/// A store that also delivers change notifications.
pub trait RoomBackend: RoomStore + Realtime {}

impl<T: RoomStore + Realtime> RoomBackend for T {}
