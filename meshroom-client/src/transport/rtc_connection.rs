use crate::media::{LocalStream, LocalTrack, RemoteTrack, TrackKind};
use crate::transport::peer_connection::{ConnectionFactory, PeerConnection, SdpType};
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::{ConnectionStatus, TransportEvent};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use meshroom_core::ParticipantId;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_remote::TrackRemote;

/// [`ConnectionFactory`] backed by the `webrtc` crate.
#[derive(Clone, Default)]
pub struct RtcConnectionFactory {
    config: TransportConfig,
}

impl RtcConnectionFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ConnectionFactory for RtcConnectionFactory {
    async fn create(
        &self,
        remote_id: ParticipantId,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerConnection>> {
        let connection = RtcConnection::new(remote_id, &self.config, event_tx).await?;
        Ok(Box::new(connection))
    }
}

pub struct RtcConnection {
    pub remote_id: ParticipantId,
    peer_connection: Arc<RTCPeerConnection>,
    senders: Mutex<Vec<(TrackKind, Arc<RTCRtpSender>)>>,
}

impl RtcConnection {
    /// Builds the peer connection and wires its callbacks into `event_tx`.
    pub async fn new(
        remote_id: ParticipantId,
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = config
            .ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
                ..Default::default()
            })
            .collect();

        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        let uid_state = remote_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!("Peer connection state changed for {}: {:?}", uid, s);
                    let status = match s {
                        RTCPeerConnectionState::New => ConnectionStatus::New,
                        RTCPeerConnectionState::Connecting => ConnectionStatus::Connecting,
                        RTCPeerConnectionState::Connected => ConnectionStatus::Connected,
                        RTCPeerConnectionState::Disconnected => ConnectionStatus::Disconnected,
                        RTCPeerConnectionState::Failed => ConnectionStatus::Failed,
                        RTCPeerConnectionState::Closed => ConnectionStatus::Closed,
                        _ => return,
                    };
                    let _ = tx.send(TransportEvent::StateChanged(uid, status)).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        let uid_ice = remote_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(json_candidate) = candidate.to_json() else {
                    return;
                };
                let Ok(str_candidate) = serde_json::to_string(&json_candidate) else {
                    return;
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(uid, str_candidate))
                    .await;
            })
        }));

        let track_tx = event_tx;
        let uid_track = remote_id.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let uid = uid_track.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        RTPCodecType::Video => TrackKind::Video,
                        _ => return,
                    };
                    debug!("Remote {:?} track {} from {}", kind, track.id(), uid);
                    let remote = RemoteTrack {
                        track_id: track.id(),
                        stream_id: track.stream_id(),
                        kind,
                        handle: Some(track),
                    };
                    let _ = tx.send(TransportEvent::RemoteTrack(uid, remote)).await;
                })
            },
        ));

        Ok(Self {
            remote_id,
            peer_connection,
            senders: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PeerConnection for RtcConnection {
    async fn add_local_stream(&self, stream: &LocalStream) -> Result<()> {
        let mut senders = self.senders.lock().await;
        for track in stream.tracks() {
            let sender = self.peer_connection.add_track(track.rtp_track()).await?;

            // RTCP has to be drained for the interceptors to keep working.
            let rtcp_sender = sender.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1500];
                while rtcp_sender.read(&mut buf).await.is_ok() {}
            });

            senders.push((track.kind(), sender));
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<String> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn set_remote_description(&self, kind: SdpType, sdp: String) -> Result<()> {
        let desc = match kind {
            SdpType::Offer => RTCSessionDescription::offer(sdp)?,
            SdpType::Answer => RTCSessionDescription::answer(sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate_json: String) -> Result<()> {
        let candidate: RTCIceCandidateInit =
            serde_json::from_str(&candidate_json).context("Failed to parse ICE candidate JSON")?;
        self.peer_connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    async fn replace_video_track(&self, track: Arc<LocalTrack>) -> Result<()> {
        let senders = self.senders.lock().await;
        let (_, sender) = senders
            .iter()
            .find(|(kind, _)| *kind == TrackKind::Video)
            .ok_or_else(|| anyhow!("no outgoing video track to {}", self.remote_id))?;
        sender.replace_track(Some(track.rtp_track())).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
