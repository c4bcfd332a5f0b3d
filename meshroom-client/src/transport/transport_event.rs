use meshroom_core::ParticipantId;

use crate::media::RemoteTrack;

/// Coarse connection status reported by the underlying transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Events a peer connection produces on its own, routed back into the room
/// event loop. Each carries the remote participant the connection belongs to.
#[derive(Debug)]
pub enum TransportEvent {
    /// A local ICE candidate was gathered; it must be relayed to the remote side.
    CandidateGenerated(ParticipantId, String),

    /// The remote side started sending a media track.
    RemoteTrack(ParticipantId, RemoteTrack),

    StateChanged(ParticipantId, ConnectionStatus),
}
