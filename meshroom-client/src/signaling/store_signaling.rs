use async_trait::async_trait;
use meshroom_core::{ParticipantId, RoomId, SignalEnvelope, SignalKind};
use std::sync::Arc;
use tracing::{debug, error};

use crate::signaling::SignalingOutput;
use crate::store::RoomStore;

/// Relays signaling by inserting envelopes into the store's signaling table;
/// the realtime feed delivers them to the target.
#[derive(Clone)]
pub struct StoreSignaling {
    store: Arc<dyn RoomStore>,
    room_id: RoomId,
    local_id: ParticipantId,
}

impl StoreSignaling {
    pub fn new(store: Arc<dyn RoomStore>, room_id: RoomId, local_id: ParticipantId) -> Self {
        Self {
            store,
            room_id,
            local_id,
        }
    }

    pub async fn send_signal(&self, to: &ParticipantId, kind: SignalKind, payload: String) {
        let envelope = SignalEnvelope::addressed(
            self.room_id,
            self.local_id.clone(),
            to.clone(),
            kind,
            payload,
        );

        debug!("Sending {:?} to {}", kind, to);
        if let Err(e) = self.store.insert_signal(envelope).await {
            error!("Failed to send {:?} to {}: {}", kind, to, e);
        }
    }
}

#[async_trait]
impl SignalingOutput for StoreSignaling {
    async fn send_offer(&self, to: &ParticipantId, sdp: String) {
        self.send_signal(to, SignalKind::Offer, sdp).await;
    }

    async fn send_answer(&self, to: &ParticipantId, sdp: String) {
        self.send_signal(to, SignalKind::Answer, sdp).await;
    }

    async fn send_ice(&self, to: &ParticipantId, candidate: String) {
        self.send_signal(to, SignalKind::IceCandidate, candidate)
            .await;
    }
}
