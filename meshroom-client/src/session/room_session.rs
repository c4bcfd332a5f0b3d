use meshroom_core::{ChatMessage, ParticipantId, ParticipantRecord, RoomId};
use std::future::pending;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{RoomError, StoreError};
use crate::media::{LocalStream, MediaSource, TrackKind};
use crate::mesh::MeshManager;
use crate::session::{ChatLog, RoomCommand, RoomHandle, RoomSnapshot};
use crate::signaling::StoreSignaling;
use crate::store::{ChangeEvent, RoomBackend, RoomStore, Subscription};
use crate::transport::{ConnectionFactory, TransportEvent};

const DEFAULT_DISPLAY_NAME: &str = "Guest";

/// Who joins which room.
#[derive(Debug, Clone)]
pub struct JoinParams {
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
    pub display_name: String,
}

/// External collaborators of a room session.
#[derive(Clone)]
pub struct RoomDeps {
    pub backend: Arc<dyn RoomBackend>,
    pub media: Arc<dyn MediaSource>,
    pub connections: Arc<dyn ConnectionFactory>,
}

/// The room event loop.
///
/// Owns the mesh, the chat log and the local media; every command, realtime
/// change and transport event is handled here one at a time.
pub struct RoomSession {
    room_id: RoomId,
    local: ParticipantRecord,
    backend: Arc<dyn RoomBackend>,
    media: Arc<dyn MediaSource>,
    camera: LocalStream,
    screen: Option<LocalStream>,
    mesh: MeshManager,
    chat: ChatLog,
    audio_enabled: bool,
    video_enabled: bool,
    connected: bool,
    subscription: Option<Subscription>,
    command_rx: mpsc::Receiver<RoomCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    snapshot_tx: watch::Sender<RoomSnapshot>,
}

impl RoomSession {
    /// Acquires media, registers presence, joins the mesh and starts the loop.
    ///
    /// A media failure returns before anything is registered. Later failures
    /// undo presence and release media before returning.
    pub async fn join(
        params: JoinParams,
        deps: RoomDeps,
        config: &ClientConfig,
    ) -> Result<RoomHandle, RoomError> {
        let room_id = params.room_id;
        let display_name = match params.display_name.trim() {
            "" => DEFAULT_DISPLAY_NAME.to_owned(),
            name => name.to_owned(),
        };

        let camera = deps
            .media
            .acquire(&config.media)
            .await
            .map_err(RoomError::MediaAcquisition)?;

        let subscription = match deps.backend.subscribe(room_id).await {
            Ok(subscription) => subscription,
            Err(e) => {
                camera.stop();
                return Err(e.into());
            }
        };

        let local = match deps
            .backend
            .upsert_participant(room_id, &params.participant_id, &display_name)
            .await
        {
            Ok(local) => local,
            Err(e) => {
                camera.stop();
                subscription.close();
                return Err(e.into());
            }
        };

        let (messages, existing) = match load_room(deps.backend.as_ref(), room_id).await {
            Ok(loaded) => loaded,
            Err(e) => {
                camera.stop();
                subscription.close();
                if let Err(err) = deps
                    .backend
                    .remove_participant(room_id, &local.participant_id)
                    .await
                {
                    warn!("Failed to remove presence after failed join: {}", err);
                }
                return Err(e.into());
            }
        };

        let (transport_tx, transport_rx) = mpsc::channel(config.mesh.event_channel_capacity);
        let (command_tx, command_rx) = mpsc::channel(config.mesh.command_channel_capacity);

        let store: Arc<dyn RoomStore> = deps.backend.clone();
        let signaling = Arc::new(StoreSignaling::new(
            store,
            room_id,
            local.participant_id.clone(),
        ));
        let mut mesh = MeshManager::new(
            local.clone(),
            camera.clone(),
            deps.connections,
            signaling,
            transport_tx,
            config.mesh.clone(),
        );
        mesh.reconcile_existing(existing).await;

        let mut chat = ChatLog::default();
        chat.extend(messages);

        let (snapshot_tx, snapshot_rx) = watch::channel(RoomSnapshot::default());
        let session = RoomSession {
            room_id,
            local: local.clone(),
            backend: deps.backend,
            media: deps.media,
            camera: camera.clone(),
            screen: None,
            mesh,
            chat,
            audio_enabled: true,
            video_enabled: true,
            connected: true,
            subscription: Some(subscription),
            command_rx,
            transport_rx,
            snapshot_tx,
        };
        session.publish();

        info!(
            "{} joined room {} as {}",
            local.display_name, room_id, local.participant_id
        );
        tokio::spawn(session.run());

        Ok(RoomHandle::new(
            room_id,
            local.participant_id,
            local.display_name,
            command_tx,
            snapshot_rx,
            camera,
        ))
    }

    async fn run(mut self) {
        info!("Room event loop started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if !self.handle_command(c).await {
                                break;
                            }
                        }
                        None => {
                            info!("Command channel closed. Leaving room.");
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                change = next_change(&mut self.subscription) => {
                    match change {
                        Some(c) => self.handle_change(c).await,
                        None => {
                            warn!("Realtime subscription closed unexpectedly");
                            self.subscription = None;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    match evt {
                        Some(e) => {
                            if self.mesh.on_transport_event(e).await {
                                self.publish();
                            }
                        }
                        None => {
                            warn!("Transport channel closed unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        info!("Room event loop finished");
    }

    /// Returns `false` once the session is over.
    async fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::ToggleAudio { reply } => {
                self.audio_enabled = !self.audio_enabled;
                self.camera.set_enabled(TrackKind::Audio, self.audio_enabled);
                self.publish();
                let _ = reply.send(self.audio_enabled);
            }

            RoomCommand::ToggleVideo { reply } => {
                self.video_enabled = !self.video_enabled;
                self.camera.set_enabled(TrackKind::Video, self.video_enabled);
                if let Some(screen) = &self.screen {
                    screen.set_enabled(TrackKind::Video, self.video_enabled);
                }
                self.publish();
                let _ = reply.send(self.video_enabled);
            }

            RoomCommand::SendChat { text, reply } => {
                let res = match self
                    .backend
                    .insert_message(self.room_id, &self.local.display_name, &text)
                    .await
                {
                    Ok(message) => {
                        debug!("Chat message {} sent", message.id);
                        Ok(())
                    }
                    Err(e) => {
                        warn!("Failed to send chat message: {}", e);
                        Err(e.into())
                    }
                };
                let _ = reply.send(res);
            }

            RoomCommand::ShareScreen { reply } => {
                let res = self.share_screen().await;
                self.publish();
                let _ = reply.send(res);
            }

            RoomCommand::StopScreenShare { reply } => {
                self.stop_screen_share().await;
                self.publish();
                let _ = reply.send(());
            }

            RoomCommand::Leave { reply } => {
                self.shutdown().await;
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    async fn handle_change(&mut self, change: ChangeEvent) {
        let changed = match change {
            ChangeEvent::MessageInserted(message) => self.chat.insert(message),
            ChangeEvent::ParticipantInserted(record) => {
                self.mesh.on_participant_joined(record).await
            }
            ChangeEvent::ParticipantDeleted(id) => self.mesh.on_participant_left(&id).await,
            ChangeEvent::SignalInserted(envelope) => self.mesh.on_signal(envelope).await,
            ChangeEvent::WaitingInserted(_) | ChangeEvent::WaitingDeleted(_) => false,
        };

        if changed {
            self.publish();
        }
    }

    async fn share_screen(&mut self) -> Result<(), RoomError> {
        if self.screen.is_some() {
            return Ok(());
        }

        let screen = self
            .media
            .acquire_screen()
            .await
            .map_err(RoomError::MediaAcquisition)?;
        let Some(track) = screen.video_track().cloned() else {
            screen.stop();
            return Ok(());
        };

        track.set_enabled(self.video_enabled);
        self.mesh.set_outgoing_video(track).await;
        self.screen = Some(screen);
        info!("Screen sharing started");
        Ok(())
    }

    async fn stop_screen_share(&mut self) {
        let Some(screen) = self.screen.take() else {
            return;
        };
        screen.stop();

        if let Some(camera) = self.camera.video_track().cloned() {
            self.mesh.set_outgoing_video(camera).await;
        }
        info!("Screen sharing stopped");
    }

    /// Leave in order: stop media, remove presence, unsubscribe, close links.
    async fn shutdown(&mut self) {
        if !self.connected {
            return;
        }
        info!("Leaving room {}", self.room_id);

        self.camera.stop();
        if let Some(screen) = self.screen.take() {
            screen.stop();
        }

        if let Err(e) = self
            .backend
            .remove_participant(self.room_id, &self.local.participant_id)
            .await
        {
            error!("Failed to remove presence for {}: {}", self.local.participant_id, e);
        }

        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }

        self.mesh.close_all().await;
        self.connected = false;
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(RoomSnapshot {
            participants: self.mesh.participants(),
            messages: self.chat.messages().to_vec(),
            is_connected: self.connected,
            is_audio_enabled: self.audio_enabled,
            is_video_enabled: self.video_enabled,
            is_screen_sharing: self.screen.is_some(),
        });
    }
}

async fn load_room(
    store: &dyn RoomBackend,
    room_id: RoomId,
) -> Result<(Vec<ChatMessage>, Vec<ParticipantRecord>), StoreError> {
    let messages = store.list_messages(room_id).await?;
    let participants = store.list_participants(room_id).await?;
    Ok((messages, participants))
}

async fn next_change(subscription: &mut Option<Subscription>) -> Option<ChangeEvent> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => pending().await,
    }
}
