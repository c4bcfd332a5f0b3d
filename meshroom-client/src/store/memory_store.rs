use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use meshroom_core::{
    ChatMessage, ParticipantId, ParticipantRecord, Room, RoomId, Session, SessionStatus,
    SignalEnvelope, WaitingEntry,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{ChangeEvent, Realtime, RoomStore, Subscription};

struct MemoryInner {
    rooms: DashMap<String, Room>,
    participants: DashMap<RoomId, Vec<ParticipantRecord>>,
    messages: DashMap<RoomId, Vec<ChatMessage>>,
    signals: DashMap<RoomId, Vec<SignalEnvelope>>,
    waiting: DashMap<RoomId, Vec<WaitingEntry>>,
    sessions: DashMap<RoomId, Session>,
    subscribers: DashMap<u64, (RoomId, mpsc::UnboundedSender<ChangeEvent>)>,
    next_subscriber: AtomicU64,
    next_join_order: AtomicU64,
}

/// In-process store and realtime feed.
///
/// Every insert/delete is fanned out to the subscribers of the room in the
/// order the writes happen. Cloning shares the same tables.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                rooms: DashMap::new(),
                participants: DashMap::new(),
                messages: DashMap::new(),
                signals: DashMap::new(),
                waiting: DashMap::new(),
                sessions: DashMap::new(),
                subscribers: DashMap::new(),
                next_subscriber: AtomicU64::new(0),
                next_join_order: AtomicU64::new(0),
            }),
        }
    }

    /// Every signaling row written for `room_id`, in insertion order.
    pub fn signals(&self, room_id: RoomId) -> Vec<SignalEnvelope> {
        self.inner
            .signals
            .get(&room_id)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Number of live subscriptions on `room_id`.
    pub fn subscriber_count(&self, room_id: RoomId) -> usize {
        self.inner
            .subscribers
            .iter()
            .filter(|entry| entry.value().0 == room_id && !entry.value().1.is_closed())
            .count()
    }

    fn publish(&self, room_id: RoomId, event: ChangeEvent) {
        let mut dead = Vec::new();
        for entry in self.inner.subscribers.iter() {
            let (room, tx) = entry.value();
            if *room != room_id {
                continue;
            }
            if tx.send(event.clone()).is_err() {
                dead.push(*entry.key());
            }
        }

        for id in dead {
            debug!("Dropping closed subscription {} on room {}", id, room_id);
            self.inner.subscribers.remove(&id);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn find_room_by_code(&self, room_code: &str) -> Result<Option<Room>, StoreError> {
        Ok(self.inner.rooms.get(room_code).map(|room| room.clone()))
    }

    async fn create_room(&self, room_code: &str, name: &str) -> Result<Room, StoreError> {
        match self.inner.rooms.entry(room_code.to_owned()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("room_code {room_code}"))),
            Entry::Vacant(slot) => {
                let room = Room {
                    id: RoomId::new(),
                    room_code: room_code.to_owned(),
                    name: name.to_owned(),
                    created_at: Utc::now(),
                };
                slot.insert(room.clone());
                Ok(room)
            }
        }
    }

    async fn upsert_participant(
        &self,
        room_id: RoomId,
        participant_id: &ParticipantId,
        display_name: &str,
    ) -> Result<ParticipantRecord, StoreError> {
        let record = {
            let mut rows = self.inner.participants.entry(room_id).or_default();
            if let Some(existing) = rows
                .iter_mut()
                .find(|r| &r.participant_id == participant_id)
            {
                existing.display_name = display_name.to_owned();
                return Ok(existing.clone());
            }

            let record = ParticipantRecord {
                room_id,
                participant_id: participant_id.clone(),
                display_name: display_name.to_owned(),
                join_order: self.inner.next_join_order.fetch_add(1, Ordering::SeqCst) + 1,
                joined_at: Utc::now(),
            };
            rows.push(record.clone());
            record
        };

        self.publish(room_id, ChangeEvent::ParticipantInserted(record.clone()));
        Ok(record)
    }

    async fn remove_participant(
        &self,
        room_id: RoomId,
        participant_id: &ParticipantId,
    ) -> Result<bool, StoreError> {
        let removed = match self.inner.participants.get_mut(&room_id) {
            Some(mut rows) => {
                let before = rows.len();
                rows.retain(|r| &r.participant_id != participant_id);
                rows.len() != before
            }
            None => false,
        };

        if removed {
            self.publish(room_id, ChangeEvent::ParticipantDeleted(participant_id.clone()));
        }
        Ok(removed)
    }

    async fn list_participants(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<ParticipantRecord>, StoreError> {
        let mut rows = self
            .inner
            .participants
            .get(&room_id)
            .map(|rows| rows.clone())
            .unwrap_or_default();
        rows.sort_by_key(|r| r.join_order);
        Ok(rows)
    }

    async fn insert_message(
        &self,
        room_id: RoomId,
        sender_name: &str,
        content: &str,
    ) -> Result<ChatMessage, StoreError> {
        let message = {
            let mut rows = self.inner.messages.entry(room_id).or_default();
            let now = Utc::now();
            // created_at doubles as the ordering key, so keep it strictly increasing.
            let created_at = match rows.last() {
                Some(last) if now <= last.created_at => last.created_at + TimeDelta::microseconds(1),
                _ => now,
            };
            let message = ChatMessage {
                id: Uuid::new_v4(),
                sender_name: sender_name.to_owned(),
                content: content.to_owned(),
                created_at,
            };
            rows.push(message.clone());
            message
        };

        self.publish(room_id, ChangeEvent::MessageInserted(message.clone()));
        Ok(message)
    }

    async fn list_messages(&self, room_id: RoomId) -> Result<Vec<ChatMessage>, StoreError> {
        Ok(self
            .inner
            .messages
            .get(&room_id)
            .map(|rows| rows.clone())
            .unwrap_or_default())
    }

    async fn insert_signal(&self, envelope: SignalEnvelope) -> Result<(), StoreError> {
        let room_id = envelope.room_id;
        self.inner
            .signals
            .entry(room_id)
            .or_default()
            .push(envelope.clone());

        self.publish(room_id, ChangeEvent::SignalInserted(envelope));
        Ok(())
    }

    async fn upsert_waiting(
        &self,
        room_id: RoomId,
        participant_id: &ParticipantId,
        display_name: &str,
    ) -> Result<WaitingEntry, StoreError> {
        let entry = {
            let mut rows = self.inner.waiting.entry(room_id).or_default();
            if let Some(existing) = rows
                .iter_mut()
                .find(|e| &e.participant_id == participant_id)
            {
                existing.display_name = display_name.to_owned();
                return Ok(existing.clone());
            }

            let entry = WaitingEntry {
                participant_id: participant_id.clone(),
                display_name: display_name.to_owned(),
                joined_at: Utc::now(),
            };
            rows.push(entry.clone());
            entry
        };

        self.publish(room_id, ChangeEvent::WaitingInserted(entry.clone()));
        Ok(entry)
    }

    async fn remove_waiting(
        &self,
        room_id: RoomId,
        participant_id: &ParticipantId,
    ) -> Result<bool, StoreError> {
        let removed = match self.inner.waiting.get_mut(&room_id) {
            Some(mut rows) => {
                let before = rows.len();
                rows.retain(|e| &e.participant_id != participant_id);
                rows.len() != before
            }
            None => false,
        };

        if removed {
            self.publish(room_id, ChangeEvent::WaitingDeleted(participant_id.clone()));
        }
        Ok(removed)
    }

    async fn list_waiting(&self, room_id: RoomId) -> Result<Vec<WaitingEntry>, StoreError> {
        Ok(self
            .inner
            .waiting
            .get(&room_id)
            .map(|rows| rows.clone())
            .unwrap_or_default())
    }

    async fn create_session(
        &self,
        room_id: RoomId,
        started_at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        match self.inner.sessions.entry(room_id) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("gd_sessions.room_id {room_id}"))),
            Entry::Vacant(slot) => {
                let session = Session {
                    room_id,
                    started_at,
                    status: SessionStatus::Waiting,
                };
                slot.insert(session.clone());
                Ok(session)
            }
        }
    }

    async fn get_session(&self, room_id: RoomId) -> Result<Option<Session>, StoreError> {
        Ok(self.inner.sessions.get(&room_id).map(|s| s.clone()))
    }

    async fn set_session_status(
        &self,
        room_id: RoomId,
        status: SessionStatus,
    ) -> Result<(), StoreError> {
        match self.inner.sessions.get_mut(&room_id) {
            Some(mut session) => {
                session.status = status;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("session for room {room_id}"))),
        }
    }
}

#[async_trait]
impl Realtime for MemoryStore {
    async fn subscribe(&self, room_id: RoomId) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribers.insert(id, (room_id, tx));
        Ok(Subscription::new(room_id, rx))
    }
}
