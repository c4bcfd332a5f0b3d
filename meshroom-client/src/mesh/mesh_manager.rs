use futures::future::join_all;
use meshroom_core::{ParticipantId, ParticipantRecord, SignalEnvelope, SignalKind};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::link::{LinkEvent, LinkRole, LinkState, PeerLink};
use crate::media::{LocalStream, LocalTrack, RemoteStream};
use crate::mesh::{MeshConfig, Roster};
use crate::signaling::SignalingOutput;
use crate::transport::{ConnectionFactory, TransportEvent};

/// A participant as the presentation layer sees it.
#[derive(Debug, Clone)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub display_name: String,
    pub is_local: bool,
    pub role: Option<LinkRole>,
    pub state: Option<LinkState>,
    pub stream: Option<RemoteStream>,
}

/// Keeps one [`PeerLink`] per remote participant of a full mesh.
///
/// Who initiates is decided by join order: a participant offers to everyone
/// who joined before it and waits for offers from everyone who joined after.
/// Every method returns whether the participant list changed.
///
/// Participant ids are not reused within a room session: once a participant
/// has left, replayed presence rows and signals from it are dropped.
///
/// A link closed by a failed transport is not re-established; the participant
/// stays in the roster without a link until it leaves.
pub struct MeshManager {
    local: ParticipantRecord,
    local_stream: LocalStream,
    roster: Roster,
    links: HashMap<ParticipantId, PeerLink>,
    early_candidates: HashMap<ParticipantId, Vec<String>>,
    departed: HashSet<ParticipantId>,
    connections: Arc<dyn ConnectionFactory>,
    signaling: Arc<dyn SignalingOutput>,
    transport_tx: mpsc::Sender<TransportEvent>,
    config: MeshConfig,
}

impl MeshManager {
    pub fn new(
        local: ParticipantRecord,
        local_stream: LocalStream,
        connections: Arc<dyn ConnectionFactory>,
        signaling: Arc<dyn SignalingOutput>,
        transport_tx: mpsc::Sender<TransportEvent>,
        config: MeshConfig,
    ) -> Self {
        Self {
            local,
            local_stream,
            roster: Roster::new(),
            links: HashMap::new(),
            early_candidates: HashMap::new(),
            departed: HashSet::new(),
            connections,
            signaling,
            transport_tx,
            config,
        }
    }

    pub fn local_id(&self) -> &ParticipantId {
        &self.local.participant_id
    }

    pub fn local_stream(&self) -> &LocalStream {
        &self.local_stream
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn link(&self, remote_id: &ParticipantId) -> Option<&PeerLink> {
        self.links.get(remote_id)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Candidates held for senders that have no link yet.
    pub fn buffered_candidates(&self) -> usize {
        self.early_candidates.values().map(Vec::len).sum()
    }

    /// Local participant first, then the roster in join order.
    pub fn participants(&self) -> Vec<ParticipantView> {
        let local = ParticipantView {
            id: self.local.participant_id.clone(),
            display_name: self.local.display_name.clone(),
            is_local: true,
            role: None,
            state: None,
            stream: None,
        };

        std::iter::once(local)
            .chain(self.roster.members().iter().map(|member| {
                let link = self.links.get(&member.participant_id);
                ParticipantView {
                    id: member.participant_id.clone(),
                    display_name: member.display_name.clone(),
                    is_local: false,
                    role: link.map(|l| l.role()),
                    state: link.map(|l| l.state()),
                    stream: link.and_then(|l| l.remote_stream().cloned()),
                }
            }))
            .collect()
    }

    pub async fn on_participant_joined(&mut self, record: ParticipantRecord) -> bool {
        if record.participant_id == self.local.participant_id {
            return false;
        }
        if self.departed.contains(&record.participant_id) {
            debug!("Presence of departed {} replayed, dropping", record.participant_id);
            return false;
        }

        let remote_id = record.participant_id.clone();
        let joined_earlier = record.join_order < self.local.join_order;
        if !self.roster.add(record) {
            return false;
        }
        info!("Participant {} joined", remote_id);

        if joined_earlier && !self.links.contains_key(&remote_id) {
            self.initiate(remote_id).await;
        }
        true
    }

    pub async fn on_participant_left(&mut self, remote_id: &ParticipantId) -> bool {
        if *remote_id == self.local.participant_id {
            return false;
        }
        self.departed.insert(remote_id.clone());
        self.early_candidates.remove(remote_id);
        let removed = self.roster.remove(remote_id).is_some();
        if removed {
            info!("Participant {} left", remote_id);
        }

        let Some(mut link) = self.links.remove(remote_id) else {
            return removed;
        };
        link.close().await;
        true
    }

    /// Joins the mesh against the participants already present.
    pub async fn reconcile_existing(&mut self, records: Vec<ParticipantRecord>) -> bool {
        let mut changed = false;
        for record in records {
            changed |= self.on_participant_joined(record).await;
        }
        changed
    }

    pub async fn on_signal(&mut self, envelope: SignalEnvelope) -> bool {
        if !envelope.is_for(&self.local.participant_id) {
            return false;
        }
        let remote_id = envelope.sender_id;
        if self.departed.contains(&remote_id) {
            debug!("{:?} from departed {}, dropping", envelope.kind, remote_id);
            return false;
        }

        match envelope.kind {
            SignalKind::Offer => {
                let created = !self.links.contains_key(&remote_id);
                if created {
                    let Some(link) = self.open_link(remote_id.clone(), LinkRole::Responder).await
                    else {
                        return false;
                    };
                    self.links.insert(remote_id.clone(), link);
                }

                let changed = self
                    .dispatch(&remote_id, LinkEvent::RemoteOffer(envelope.payload))
                    .await;

                for candidate in self.early_candidates.remove(&remote_id).unwrap_or_default() {
                    self.dispatch(&remote_id, LinkEvent::RemoteCandidate(candidate))
                        .await;
                }
                created || changed
            }

            SignalKind::Answer => {
                if !self.links.contains_key(&remote_id) {
                    debug!("Answer from {} without a link, dropping", remote_id);
                    return false;
                }
                self.dispatch(&remote_id, LinkEvent::RemoteAnswer(envelope.payload))
                    .await
            }

            SignalKind::IceCandidate => {
                if self.links.contains_key(&remote_id) {
                    return self
                        .dispatch(&remote_id, LinkEvent::RemoteCandidate(envelope.payload))
                        .await;
                }

                let buffered = self.early_candidates.entry(remote_id.clone()).or_default();
                if buffered.len() < self.config.max_buffered_candidates {
                    buffered.push(envelope.payload);
                } else {
                    warn!("Candidate buffer full for {}, dropping", remote_id);
                }
                false
            }
        }
    }

    /// Routes a connection-originated event to the link that owns it.
    pub async fn on_transport_event(&mut self, event: TransportEvent) -> bool {
        let (remote_id, link_event) = match event {
            TransportEvent::CandidateGenerated(id, candidate) => {
                (id, LinkEvent::LocalCandidate(candidate))
            }
            TransportEvent::RemoteTrack(id, track) => (id, LinkEvent::RemoteTrack(track)),
            TransportEvent::StateChanged(id, status) => (id, LinkEvent::Transport(status)),
        };

        if !self.links.contains_key(&remote_id) {
            debug!("Transport event for unknown link {}, dropping", remote_id);
            return false;
        }
        self.dispatch(&remote_id, link_event).await
    }

    /// Sends `video` instead of the current outgoing video on every link.
    pub async fn set_outgoing_video(&mut self, video: Arc<LocalTrack>) {
        self.local_stream = self.local_stream.with_video(video.clone());
        join_all(
            self.links
                .values()
                .map(|link| link.replace_video_track(video.clone())),
        )
        .await;
    }

    pub async fn close_all(&mut self) {
        join_all(self.links.values_mut().map(|link| link.close())).await;
        self.links.clear();
        self.early_candidates.clear();
        self.departed.clear();
        self.roster.clear();
    }

    async fn initiate(&mut self, remote_id: ParticipantId) {
        let Some(mut link) = self.open_link(remote_id.clone(), LinkRole::Initiator).await else {
            return;
        };
        link.handle(LinkEvent::Start, self.signaling.as_ref()).await;
        self.links.insert(remote_id, link);
    }

    async fn open_link(&self, remote_id: ParticipantId, role: LinkRole) -> Option<PeerLink> {
        match self
            .connections
            .create(remote_id.clone(), self.transport_tx.clone())
            .await
        {
            Ok(connection) => Some(
                PeerLink::open(
                    remote_id,
                    role,
                    connection,
                    &self.local_stream,
                    self.config.max_buffered_candidates,
                )
                .await,
            ),
            Err(e) => {
                error!("Failed to create transport for {}: {:?}", remote_id, e);
                None
            }
        }
    }

    /// Feeds `event` to the link of `remote_id`; a link that ends up closed is
    /// dropped, its roster entry stays.
    async fn dispatch(&mut self, remote_id: &ParticipantId, event: LinkEvent) -> bool {
        let Some(link) = self.links.get_mut(remote_id) else {
            return false;
        };
        let changed = link.handle(event, self.signaling.as_ref()).await;

        if link.is_closed() {
            self.links.remove(remote_id);
        }
        changed
    }
}
