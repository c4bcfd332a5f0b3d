use crate::model::participant::ParticipantId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// One signaling row relayed between two participants of a room.
///
/// `target_id = None` means broadcast. The payload is SDP text for offers and
/// answers and a JSON candidate init for ICE candidates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignalEnvelope {
    pub room_id: RoomId,
    pub sender_id: ParticipantId,
    pub target_id: Option<ParticipantId>,
    pub kind: SignalKind,
    pub payload: String,
}

impl SignalEnvelope {
    pub fn addressed(
        room_id: RoomId,
        sender_id: ParticipantId,
        target_id: ParticipantId,
        kind: SignalKind,
        payload: String,
    ) -> Self {
        Self {
            room_id,
            sender_id,
            target_id: Some(target_id),
            kind,
            payload,
        }
    }

    /// Whether `participant` should act on this envelope.
    pub fn is_for(&self, participant: &ParticipantId) -> bool {
        if &self.sender_id == participant {
            return false;
        }
        match &self.target_id {
            Some(target) => target == participant,
            None => true,
        }
    }
}
