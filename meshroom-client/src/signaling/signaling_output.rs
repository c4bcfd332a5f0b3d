use async_trait::async_trait;
use meshroom_core::ParticipantId;

/// Outbound half of the signaling protocol, addressed to one remote participant.
///
/// Delivery failures are logged by the implementation and never reported back:
/// a lost message only means that link never connects.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_offer(&self, to: &ParticipantId, sdp: String);

    async fn send_answer(&self, to: &ParticipantId, sdp: String);

    /// `candidate` is a JSON-serialized candidate init.
    async fn send_ice(&self, to: &ParticipantId, candidate: String);
}
