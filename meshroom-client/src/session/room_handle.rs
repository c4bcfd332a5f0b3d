use meshroom_core::{ParticipantId, RoomId};
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::RoomError;
use crate::media::LocalStream;
use crate::session::{RoomCommand, RoomSnapshot};

/// The presentation layer's side of a joined room.
///
/// Cheap to clone; every clone talks to the same event loop.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    participant_id: ParticipantId,
    display_name: String,
    command_tx: mpsc::Sender<RoomCommand>,
    snapshot_rx: watch::Receiver<RoomSnapshot>,
    local_stream: LocalStream,
}

impl RoomHandle {
    pub(crate) fn new(
        room_id: RoomId,
        participant_id: ParticipantId,
        display_name: String,
        command_tx: mpsc::Sender<RoomCommand>,
        snapshot_rx: watch::Receiver<RoomSnapshot>,
        local_stream: LocalStream,
    ) -> Self {
        Self {
            room_id,
            participant_id,
            display_name,
            command_tx,
            snapshot_rx,
            local_stream,
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Local camera/microphone capture, for the self view.
    pub fn local_stream(&self) -> &LocalStream {
        &self.local_stream
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// A receiver notified on every change.
    pub fn watch(&self) -> watch::Receiver<RoomSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Waits until `pred` holds for the current snapshot. Returns `None` if
    /// the session ended first.
    pub async fn wait_until(
        &self,
        mut pred: impl FnMut(&RoomSnapshot) -> bool,
    ) -> Option<RoomSnapshot> {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx.wait_for(|s| pred(s)).await.ok()?;
        Some(snapshot.clone())
    }

    /// Returns whether audio is now enabled.
    pub async fn toggle_audio(&self) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::ToggleAudio { reply })
            .await
    }

    /// Returns whether video is now enabled.
    pub async fn toggle_video(&self) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::ToggleVideo { reply })
            .await
    }

    pub async fn send_chat_message(&self, text: &str) -> Result<(), RoomError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RoomError::EmptyMessage);
        }
        self.request(|reply| RoomCommand::SendChat {
            text: text.to_owned(),
            reply,
        })
        .await?
    }

    pub async fn share_screen(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::ShareScreen { reply })
            .await?
    }

    pub async fn stop_screen_share(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::StopScreenShare { reply })
            .await
    }

    /// Leaves the room. Calling it again, from any clone, is a no-op.
    pub async fn leave(&self) -> Result<(), RoomError> {
        match self.request(|reply| RoomCommand::Leave { reply }).await {
            Ok(()) | Err(RoomError::NotConnected) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(command(reply))
            .await
            .map_err(|_| RoomError::NotConnected)?;
        rx.await.map_err(|_| RoomError::NotConnected)
    }
}
