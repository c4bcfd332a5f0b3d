use crate::link::LinkEvent;
use crate::transport::ConnectionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    New,
    OfferSent,
    OfferReceived,
    Answered,
    Connected,
    Closed,
}

impl LinkState {
    /// Whether the remote session description has been applied, i.e. remote
    /// candidates can be added directly.
    pub fn has_remote_description(self) -> bool {
        matches!(
            self,
            LinkState::OfferReceived | LinkState::Answered | LinkState::Connected
        )
    }
}

/// What a link has to do in reaction to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    SendOffer,
    AnswerOffer,
    RetryAnswer,
    ApplyAnswer,
    AddCandidate,
    BufferCandidate,
    RelayCandidate,
    AttachTrack { connected: bool },
    Close,
    Ignore(&'static str),
}

/// Transition function of a peer link; effects are carried out by
/// [`PeerLink::handle`](crate::link::PeerLink::handle).
pub(crate) fn plan(role: LinkRole, state: LinkState, event: &LinkEvent) -> Step {
    if state == LinkState::Closed {
        return Step::Ignore("link closed");
    }

    match event {
        LinkEvent::Start => match (role, state) {
            (LinkRole::Initiator, LinkState::New) => Step::SendOffer,
            _ => Step::Ignore("already started"),
        },
        LinkEvent::RemoteOffer(_) => match (role, state) {
            (LinkRole::Responder, LinkState::New) => Step::AnswerOffer,
            // Offer applied but no answer went out yet.
            (LinkRole::Responder, LinkState::OfferReceived) => Step::RetryAnswer,
            (LinkRole::Responder, _) => Step::Ignore("duplicate offer"),
            (LinkRole::Initiator, _) => Step::Ignore("offer on initiator link"),
        },
        LinkEvent::RemoteAnswer(_) => match (role, state) {
            (LinkRole::Initiator, LinkState::OfferSent) => Step::ApplyAnswer,
            _ => Step::Ignore("unexpected answer"),
        },
        LinkEvent::RemoteCandidate(_) if state.has_remote_description() => Step::AddCandidate,
        LinkEvent::RemoteCandidate(_) => Step::BufferCandidate,
        LinkEvent::LocalCandidate(_) => Step::RelayCandidate,
        LinkEvent::RemoteTrack(_) => Step::AttachTrack {
            connected: state.has_remote_description(),
        },
        LinkEvent::Transport(ConnectionStatus::Failed | ConnectionStatus::Closed) => Step::Close,
        LinkEvent::Transport(_) => Step::Ignore("status only"),
        LinkEvent::Close => Step::Close,
    }
}
