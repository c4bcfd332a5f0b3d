use crate::media::RemoteTrack;
use crate::transport::ConnectionStatus;

/// Everything that can happen to a single peer link.
#[derive(Debug)]
pub enum LinkEvent {
    /// Kick off negotiation; only meaningful for an initiator.
    Start,
    RemoteOffer(String),
    RemoteAnswer(String),
    RemoteCandidate(String),
    LocalCandidate(String),
    RemoteTrack(RemoteTrack),
    Transport(ConnectionStatus),
    Close,
}
