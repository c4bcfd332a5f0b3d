use chrono::Utc;
use meshroom_client::{
    LinkRole, LocalStream, LocalTrack, MeshConfig, MeshManager, TrackSource, TransportEvent,
};
use meshroom_core::{ParticipantId, ParticipantRecord, RoomId, SignalEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::mock_connection::MockConnectionFactory;
use super::mock_signaling::{MockSignalingOutput, SignalMessage};

/// One participant's mesh wired to mocks, driven by [`pump`].
pub struct MeshPeer {
    pub record: ParticipantRecord,
    pub mesh: MeshManager,
    pub signaling: MockSignalingOutput,
    pub connections: MockConnectionFactory,
    signal_rx: mpsc::UnboundedReceiver<SignalMessage>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    outbox: Vec<SignalEnvelope>,
}

impl MeshPeer {
    pub fn new(room_id: RoomId, id: &str, join_order: u64) -> Self {
        let record = ParticipantRecord {
            room_id,
            participant_id: ParticipantId::from(id),
            display_name: id.to_uppercase(),
            join_order,
            joined_at: Utc::now(),
        };
        let (signaling, signal_rx) = MockSignalingOutput::new();
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let connections = MockConnectionFactory::new();

        let mesh = MeshManager::new(
            record.clone(),
            camera_stream(),
            Arc::new(connections.clone()),
            Arc::new(signaling.clone()),
            transport_tx,
            MeshConfig::default(),
        );

        Self {
            record,
            mesh,
            signaling,
            connections,
            signal_rx,
            transport_rx,
            outbox: Vec::new(),
        }
    }

    pub fn id(&self) -> &ParticipantId {
        &self.record.participant_id
    }

    /// Envelopes this peer sent so far, for replaying.
    pub fn sent(&self) -> &[SignalEnvelope] {
        &self.outbox
    }

    pub fn role_toward(&self, remote: &ParticipantId) -> Option<LinkRole> {
        self.mesh.link(remote).map(|link| link.role())
    }
}

pub fn camera_stream() -> LocalStream {
    LocalStream::new(
        "camera",
        vec![
            LocalTrack::new(TrackSource::Microphone, "camera"),
            LocalTrack::new(TrackSource::Camera, "camera"),
        ],
    )
}

/// Announces every peer to every other one, the way the room session does:
/// later joiners reconcile against the earlier ones, earlier ones get a
/// participant-joined event.
pub async fn join_all(peers: &mut [MeshPeer]) {
    for i in 0..peers.len() {
        let earlier: Vec<_> = peers[..i].iter().map(|p| p.record.clone()).collect();
        peers[i].mesh.reconcile_existing(earlier).await;

        let newcomer = peers[i].record.clone();
        for peer in peers[..i].iter_mut() {
            peer.mesh.on_participant_joined(newcomer.clone()).await;
        }
    }
}

/// Delivers signals and transport events until nothing moves anymore.
pub async fn pump(room_id: RoomId, peers: &mut [MeshPeer]) {
    loop {
        let mut progressed = false;

        for i in 0..peers.len() {
            while let Ok(event) = peers[i].transport_rx.try_recv() {
                progressed = true;
                peers[i].mesh.on_transport_event(event).await;
            }

            let from = peers[i].record.participant_id.clone();
            let mut envelopes = Vec::new();
            while let Ok(msg) = peers[i].signal_rx.try_recv() {
                envelopes.push(msg.into_envelope(room_id, from.clone()));
            }
            peers[i].outbox.extend(envelopes.iter().cloned());

            for envelope in envelopes {
                progressed = true;
                for peer in peers.iter_mut() {
                    peer.mesh.on_signal(envelope.clone()).await;
                }
            }
        }

        if !progressed {
            break;
        }
    }
}
