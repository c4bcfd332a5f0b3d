use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meshroom_client::{
    ConnectionFactory, LocalStream, LocalTrack, MediaConstraints, MediaError, MediaSource,
    MemoryStore, PeerConnection, Realtime, RoomStore, SdpType, StoreError, Subscription,
    TrackMediaSource, TransportEvent,
};
use meshroom_core::{
    ChatMessage, ParticipantId, ParticipantRecord, Room, RoomId, Session, SessionStatus,
    SignalEnvelope, WaitingEntry,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use super::mock_connection::MockConnectionFactory;

/// A recorded call and what was observable from the outside when it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed {
    pub call: &'static str,
    pub media_stopped: bool,
    pub present: bool,
    pub subscribers: usize,
}

/// Shared log of one participant's calls into the backend and its connections.
#[derive(Clone)]
pub struct CallRecorder {
    store: MemoryStore,
    room_id: RoomId,
    participant_id: ParticipantId,
    camera: Arc<Mutex<Option<LocalStream>>>,
    calls: Arc<Mutex<Vec<Observed>>>,
}

impl CallRecorder {
    pub fn new(store: &MemoryStore, room_id: RoomId, participant_id: &str) -> Self {
        Self {
            store: store.clone(),
            room_id,
            participant_id: participant_id.into(),
            camera: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<Observed> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_named(&self, call: &str) -> Vec<Observed> {
        self.calls()
            .into_iter()
            .filter(|c| c.call == call)
            .collect()
    }

    async fn observe(&self, call: &'static str) {
        let present = self
            .store
            .list_participants(self.room_id)
            .await
            .map(|rows| rows.iter().any(|r| r.participant_id == self.participant_id))
            .unwrap_or(false);
        let media_stopped = self
            .camera
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|camera| camera.is_stopped());
        let subscribers = self.store.subscriber_count(self.room_id);

        self.calls.lock().unwrap().push(Observed {
            call,
            media_stopped,
            present,
            subscribers,
        });
    }
}

/// Working media whose camera stream the recorder can inspect.
pub struct RecordingMediaSource {
    recorder: CallRecorder,
}

impl RecordingMediaSource {
    pub fn new(recorder: &CallRecorder) -> Self {
        Self {
            recorder: recorder.clone(),
        }
    }
}

#[async_trait]
impl MediaSource for RecordingMediaSource {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalStream, MediaError> {
        let camera = TrackMediaSource.acquire(constraints).await?;
        *self.recorder.camera.lock().unwrap() = Some(camera.clone());
        Ok(camera)
    }

    async fn acquire_screen(&self) -> Result<LocalStream, MediaError> {
        TrackMediaSource.acquire_screen().await
    }
}

/// [`MemoryStore`] that records presence and waiting-room removals, and can
/// be told to fail loading the waiting roster.
pub struct RecordingBackend {
    inner: MemoryStore,
    recorder: CallRecorder,
    fail_list_waiting: bool,
}

impl RecordingBackend {
    pub fn new(recorder: &CallRecorder) -> Self {
        Self {
            inner: recorder.store.clone(),
            recorder: recorder.clone(),
            fail_list_waiting: false,
        }
    }

    pub fn failing_list_waiting(mut self) -> Self {
        self.fail_list_waiting = true;
        self
    }
}

#[async_trait]
impl RoomStore for RecordingBackend {
    async fn find_room_by_code(&self, room_code: &str) -> Result<Option<Room>, StoreError> {
        self.inner.find_room_by_code(room_code).await
    }

    async fn create_room(&self, room_code: &str, name: &str) -> Result<Room, StoreError> {
        self.inner.create_room(room_code, name).await
    }

    async fn upsert_participant(
        &self,
        room_id: RoomId,
        participant_id: &ParticipantId,
        display_name: &str,
    ) -> Result<ParticipantRecord, StoreError> {
        self.inner
            .upsert_participant(room_id, participant_id, display_name)
            .await
    }

    async fn remove_participant(
        &self,
        room_id: RoomId,
        participant_id: &ParticipantId,
    ) -> Result<bool, StoreError> {
        self.recorder.observe("remove_presence").await;
        self.inner.remove_participant(room_id, participant_id).await
    }

    async fn list_participants(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<ParticipantRecord>, StoreError> {
        self.inner.list_participants(room_id).await
    }

    async fn insert_message(
        &self,
        room_id: RoomId,
        sender_name: &str,
        content: &str,
    ) -> Result<ChatMessage, StoreError> {
        self.inner.insert_message(room_id, sender_name, content).await
    }

    async fn list_messages(&self, room_id: RoomId) -> Result<Vec<ChatMessage>, StoreError> {
        self.inner.list_messages(room_id).await
    }

    async fn insert_signal(&self, envelope: SignalEnvelope) -> Result<(), StoreError> {
        self.inner.insert_signal(envelope).await
    }

    async fn upsert_waiting(
        &self,
        room_id: RoomId,
        participant_id: &ParticipantId,
        display_name: &str,
    ) -> Result<WaitingEntry, StoreError> {
        self.inner
            .upsert_waiting(room_id, participant_id, display_name)
            .await
    }

    async fn remove_waiting(
        &self,
        room_id: RoomId,
        participant_id: &ParticipantId,
    ) -> Result<bool, StoreError> {
        self.recorder.observe("remove_waiting").await;
        self.inner.remove_waiting(room_id, participant_id).await
    }

    async fn list_waiting(&self, room_id: RoomId) -> Result<Vec<WaitingEntry>, StoreError> {
        if self.fail_list_waiting {
            return Err(StoreError::Unavailable("waiting roster offline".to_string()));
        }
        self.inner.list_waiting(room_id).await
    }

    async fn create_session(
        &self,
        room_id: RoomId,
        started_at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        self.inner.create_session(room_id, started_at).await
    }

    async fn get_session(&self, room_id: RoomId) -> Result<Option<Session>, StoreError> {
        self.inner.get_session(room_id).await
    }

    async fn set_session_status(
        &self,
        room_id: RoomId,
        status: SessionStatus,
    ) -> Result<(), StoreError> {
        self.inner.set_session_status(room_id, status).await
    }
}

#[async_trait]
impl Realtime for RecordingBackend {
    async fn subscribe(&self, room_id: RoomId) -> Result<Subscription, StoreError> {
        self.inner.subscribe(room_id).await
    }
}

/// Mock transport whose connections record when they are closed.
#[derive(Clone)]
pub struct RecordingConnectionFactory {
    inner: MockConnectionFactory,
    recorder: CallRecorder,
}

impl RecordingConnectionFactory {
    pub fn new(recorder: &CallRecorder) -> Self {
        Self {
            inner: MockConnectionFactory::new(),
            recorder: recorder.clone(),
        }
    }

    pub fn mock(&self) -> &MockConnectionFactory {
        &self.inner
    }
}

#[async_trait]
impl ConnectionFactory for RecordingConnectionFactory {
    async fn create(
        &self,
        remote_id: ParticipantId,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerConnection>> {
        let inner = self.inner.create(remote_id, event_tx).await?;
        Ok(Box::new(RecordingConnection {
            inner,
            recorder: self.recorder.clone(),
        }))
    }
}

struct RecordingConnection {
    inner: Box<dyn PeerConnection>,
    recorder: CallRecorder,
}

#[async_trait]
impl PeerConnection for RecordingConnection {
    async fn add_local_stream(&self, stream: &LocalStream) -> Result<()> {
        self.inner.add_local_stream(stream).await
    }

    async fn create_offer(&self) -> Result<String> {
        self.inner.create_offer().await
    }

    async fn create_answer(&self) -> Result<String> {
        self.inner.create_answer().await
    }

    async fn set_remote_description(&self, kind: SdpType, sdp: String) -> Result<()> {
        self.inner.set_remote_description(kind, sdp).await
    }

    async fn add_ice_candidate(&self, candidate_json: String) -> Result<()> {
        self.inner.add_ice_candidate(candidate_json).await
    }

    async fn replace_video_track(&self, track: Arc<LocalTrack>) -> Result<()> {
        self.inner.replace_video_track(track).await
    }

    async fn close(&self) -> Result<()> {
        self.recorder.observe("close_link").await;
        self.inner.close().await
    }
}
