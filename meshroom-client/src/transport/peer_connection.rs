use anyhow::Result;
use async_trait::async_trait;
use meshroom_core::ParticipantId;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::media::{LocalStream, LocalTrack};
use crate::transport::TransportEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpType {
    Offer,
    Answer,
}

/// One direct media connection to a remote participant.
///
/// Callbacks of the underlying implementation are not exposed; they surface as
/// [`TransportEvent`]s on the channel given to [`ConnectionFactory::create`].
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Attach every track of `stream` as an outgoing track.
    async fn add_local_stream(&self, stream: &LocalStream) -> Result<()>;

    /// Create an offer and install it as the local description.
    async fn create_offer(&self) -> Result<String>;

    /// Create an answer and install it as the local description.
    async fn create_answer(&self) -> Result<String>;

    async fn set_remote_description(&self, kind: SdpType, sdp: String) -> Result<()>;

    /// Add a remote candidate, given as a JSON candidate init.
    async fn add_ice_candidate(&self, candidate_json: String) -> Result<()>;

    /// Swap the outgoing video track without renegotiating.
    async fn replace_video_track(&self, track: Arc<LocalTrack>) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn create(
        &self,
        remote_id: ParticipantId,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerConnection>>;
}
