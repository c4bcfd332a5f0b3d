use meshroom_core::ParticipantId;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::link::{LinkEvent, LinkRole, LinkState, Step, plan};
use crate::media::{LocalStream, LocalTrack, RemoteStream};
use crate::signaling::SignalingOutput;
use crate::transport::{PeerConnection, SdpType};

/// One direct connection to a remote participant and its negotiation state.
///
/// The role is fixed at creation. A link never fails as a whole: errors from
/// the connection are logged and the link stays where it was.
pub struct PeerLink {
    remote_id: ParticipantId,
    role: LinkRole,
    state: LinkState,
    connection: Box<dyn PeerConnection>,
    remote_stream: Option<RemoteStream>,
    pending_candidates: Vec<String>,
    max_pending: usize,
}

impl PeerLink {
    /// Wraps `connection` and attaches every local track to it.
    pub async fn open(
        remote_id: ParticipantId,
        role: LinkRole,
        connection: Box<dyn PeerConnection>,
        local_stream: &LocalStream,
        max_pending: usize,
    ) -> Self {
        if let Err(e) = connection.add_local_stream(local_stream).await {
            error!("Failed to attach local media for {}: {:?}", remote_id, e);
        }

        info!("Opened {:?} link to {}", role, remote_id);
        Self {
            remote_id,
            role,
            state: LinkState::New,
            connection,
            remote_stream: None,
            pending_candidates: Vec::new(),
            max_pending,
        }
    }

    pub fn remote_id(&self) -> &ParticipantId {
        &self.remote_id
    }

    pub fn role(&self) -> LinkRole {
        self.role
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state == LinkState::Closed
    }

    /// Applies `event`. Returns whether anything visible to the presentation
    /// layer changed (state or remote media).
    pub async fn handle(&mut self, event: LinkEvent, signaling: &dyn SignalingOutput) -> bool {
        let before = self.state;
        let step = plan(self.role, self.state, &event);

        match (step, event) {
            (Step::SendOffer, _) => match self.connection.create_offer().await {
                Ok(sdp) => {
                    signaling.send_offer(&self.remote_id, sdp).await;
                    self.state = LinkState::OfferSent;
                }
                Err(e) => error!("Failed to create offer for {}: {:?}", self.remote_id, e),
            },

            (Step::AnswerOffer, LinkEvent::RemoteOffer(sdp)) => {
                if let Err(e) = self
                    .connection
                    .set_remote_description(SdpType::Offer, sdp)
                    .await
                {
                    warn!("SDP error for {}: {:?}", self.remote_id, e);
                    return false;
                }
                self.state = LinkState::OfferReceived;
                self.flush_candidates().await;
                self.answer(signaling).await;
            }

            (Step::RetryAnswer, _) => self.answer(signaling).await,

            (Step::ApplyAnswer, LinkEvent::RemoteAnswer(sdp)) => {
                if let Err(e) = self
                    .connection
                    .set_remote_description(SdpType::Answer, sdp)
                    .await
                {
                    warn!("SDP error for {}: {:?}", self.remote_id, e);
                    return false;
                }
                self.state = LinkState::Answered;
                self.flush_candidates().await;
            }

            (Step::AddCandidate, LinkEvent::RemoteCandidate(candidate)) => {
                self.add_candidate(candidate).await;
            }

            (Step::BufferCandidate, LinkEvent::RemoteCandidate(candidate)) => {
                if self.pending_candidates.len() < self.max_pending {
                    self.pending_candidates.push(candidate);
                } else {
                    warn!("Candidate buffer full for {}, dropping", self.remote_id);
                }
            }

            (Step::RelayCandidate, LinkEvent::LocalCandidate(candidate)) => {
                signaling.send_ice(&self.remote_id, candidate).await;
            }

            (Step::AttachTrack { connected }, LinkEvent::RemoteTrack(track)) => {
                debug!("Track {} attached on link to {}", track.track_id, self.remote_id);
                self.remote_stream
                    .get_or_insert_with(RemoteStream::default)
                    .add_track(track);
                if connected {
                    self.state = LinkState::Connected;
                }
                return true;
            }

            (Step::Close, _) => self.close().await,

            (Step::Ignore(reason), event) => {
                debug!("Ignoring {:?} on link to {}: {}", event, self.remote_id, reason);
            }

            (step, event) => {
                warn!("Step {:?} does not match event {:?}", step, event);
            }
        }

        self.state != before
    }

    /// Releases the connection. Idempotent.
    pub async fn close(&mut self) {
        if self.state == LinkState::Closed {
            return;
        }
        self.state = LinkState::Closed;
        self.pending_candidates.clear();

        if let Err(e) = self.connection.close().await {
            warn!("Failed to close connection to {}: {:?}", self.remote_id, e);
        }
        info!("Closed link to {}", self.remote_id);
    }

    /// Swaps the outgoing video without renegotiating.
    pub async fn replace_video_track(&self, track: Arc<LocalTrack>) {
        if self.is_closed() {
            return;
        }
        if let Err(e) = self.connection.replace_video_track(track).await {
            warn!("Failed to replace video for {}: {:?}", self.remote_id, e);
        }
    }

    /// Stays in `OfferReceived` on failure; a redelivered offer retries.
    async fn answer(&mut self, signaling: &dyn SignalingOutput) {
        match self.connection.create_answer().await {
            Ok(answer) => {
                signaling.send_answer(&self.remote_id, answer).await;
                self.state = LinkState::Answered;
            }
            Err(e) => error!("Failed to create answer for {}: {:?}", self.remote_id, e),
        }
    }

    async fn flush_candidates(&mut self) {
        for candidate in std::mem::take(&mut self.pending_candidates) {
            self.add_candidate(candidate).await;
        }
    }

    async fn add_candidate(&self, candidate: String) {
        if let Err(e) = self.connection.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate for {}: {:?}", self.remote_id, e);
        }
    }
}
