use chrono::{DateTime, Utc};
use meshroom_core::{ParticipantId, RoomId, SessionStatus, WaitingEntry};
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::RoomError;
use crate::session::{JoinParams, RoomDeps, RoomHandle, RoomSession};
use crate::store::{ChangeEvent, RoomBackend, Subscription};
use crate::waiting::{Clock, WaitingRoomConfig, resolve_session, time_remaining};

const DEFAULT_DISPLAY_NAME: &str = "Guest";

/// Identity handed from the waiting room to the room session once the wait
/// is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
    pub display_name: String,
}

impl From<Admission> for JoinParams {
    fn from(admission: Admission) -> Self {
        JoinParams {
            room_id: admission.room_id,
            participant_id: admission.participant_id,
            display_name: admission.display_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WaitingSnapshot {
    pub participants: Vec<WaitingEntry>,
    pub time_remaining: Duration,
    pub is_ready: bool,
    pub has_left: bool,
    pub session_started_at: DateTime<Utc>,
}

enum WaitingCommand {
    Leave { reply: oneshot::Sender<()> },
}

/// Counts down to the shared session start and admits the local participant
/// when it reaches zero.
pub struct WaitingRoom {
    admission: Admission,
    backend: Arc<dyn RoomBackend>,
    clock: Arc<dyn Clock>,
    config: WaitingRoomConfig,
    started_at: DateTime<Utc>,
    participants: Vec<WaitingEntry>,
    ready: bool,
    left: bool,
    subscription: Option<Subscription>,
    command_rx: mpsc::Receiver<WaitingCommand>,
    snapshot_tx: watch::Sender<WaitingSnapshot>,
}

impl WaitingRoom {
    /// Resolves the session, registers the local waiting entry and starts
    /// following the waiting roster.
    pub async fn enter(
        backend: Arc<dyn RoomBackend>,
        clock: Arc<dyn Clock>,
        config: WaitingRoomConfig,
        mut admission: Admission,
    ) -> Result<WaitingRoomHandle, RoomError> {
        let room_id = admission.room_id;
        if admission.display_name.trim().is_empty() {
            admission.display_name = DEFAULT_DISPLAY_NAME.to_owned();
        }

        let session = resolve_session(backend.as_ref(), room_id, clock.now()).await?;
        let subscription = backend.subscribe(room_id).await?;

        if let Err(e) = backend
            .upsert_waiting(room_id, &admission.participant_id, &admission.display_name)
            .await
        {
            subscription.close();
            return Err(e.into());
        }

        let participants = match backend.list_waiting(room_id).await {
            Ok(participants) => participants,
            Err(e) => {
                subscription.close();
                if let Err(err) = backend
                    .remove_waiting(room_id, &admission.participant_id)
                    .await
                {
                    warn!("Failed to remove waiting entry after failed entry: {}", err);
                }
                return Err(e.into());
            }
        };

        let (command_tx, command_rx) = mpsc::channel(8);
        let remaining = time_remaining(clock.now(), session.started_at, config.wait_duration());
        let (snapshot_tx, snapshot_rx) = watch::channel(WaitingSnapshot {
            participants: participants.clone(),
            time_remaining: remaining,
            is_ready: false,
            has_left: false,
            session_started_at: session.started_at,
        });

        info!(
            "{} waiting in room {}, {}s remaining",
            admission.participant_id,
            room_id,
            remaining.as_secs()
        );

        let waiting_room = WaitingRoom {
            admission: admission.clone(),
            backend,
            clock,
            config,
            started_at: session.started_at,
            participants,
            ready: false,
            left: false,
            subscription: Some(subscription),
            command_rx,
            snapshot_tx,
        };
        tokio::spawn(waiting_room.run());

        Ok(WaitingRoomHandle {
            admission,
            command_tx,
            snapshot_rx,
        })
    }

    async fn run(mut self) {
        let mut ticker = interval(self.config.tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.ready && !self.left {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(WaitingCommand::Leave { reply }) => {
                            self.leave().await;
                            let _ = reply.send(());
                        }
                        None => self.leave().await,
                    }
                }

                change = next_change(&mut self.subscription) => {
                    match change {
                        Some(c) => self.handle_change(c),
                        None => {
                            warn!("Waiting room subscription closed unexpectedly");
                            self.subscription = None;
                        }
                    }
                }
            }
        }

        debug!("Waiting room loop finished");
    }

    async fn tick(&mut self) {
        let remaining = time_remaining(
            self.clock.now(),
            self.started_at,
            self.config.wait_duration(),
        );

        if remaining.is_zero() {
            self.admit().await;
        }
        self.publish(remaining);
    }

    /// Runs once: the loop exits as soon as `ready` is set.
    async fn admit(&mut self) {
        let room_id = self.admission.room_id;
        info!("Wait is over, admitting {}", self.admission.participant_id);
        self.ready = true;

        self.deregister().await;
        if let Err(e) = self
            .backend
            .set_session_status(room_id, SessionStatus::Active)
            .await
        {
            error!("Failed to activate session for room {}: {}", room_id, e);
        }
    }

    async fn leave(&mut self) {
        if self.left {
            return;
        }
        self.left = true;
        self.deregister().await;
        self.publish(time_remaining(
            self.clock.now(),
            self.started_at,
            self.config.wait_duration(),
        ));
    }

    async fn deregister(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }
        if let Err(e) = self
            .backend
            .remove_waiting(self.admission.room_id, &self.admission.participant_id)
            .await
        {
            warn!(
                "Failed to remove waiting entry for {}: {}",
                self.admission.participant_id, e
            );
        }
    }

    fn handle_change(&mut self, change: ChangeEvent) {
        match change {
            ChangeEvent::WaitingInserted(entry) => {
                if self
                    .participants
                    .iter()
                    .any(|p| p.participant_id == entry.participant_id)
                {
                    return;
                }
                self.participants.push(entry);
            }
            ChangeEvent::WaitingDeleted(id) => {
                self.participants.retain(|p| p.participant_id != id);
            }
            _ => return,
        }

        let remaining = self.snapshot_tx.borrow().time_remaining;
        self.publish(remaining);
    }

    fn publish(&self, time_remaining: Duration) {
        self.snapshot_tx.send_replace(WaitingSnapshot {
            participants: self.participants.clone(),
            time_remaining,
            is_ready: self.ready,
            has_left: self.left,
            session_started_at: self.started_at,
        });
    }
}

/// The presentation layer's side of a waiting room.
#[derive(Clone)]
pub struct WaitingRoomHandle {
    admission: Admission,
    command_tx: mpsc::Sender<WaitingCommand>,
    snapshot_rx: watch::Receiver<WaitingSnapshot>,
}

impl WaitingRoomHandle {
    pub fn snapshot(&self) -> WaitingSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<WaitingSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Resolves once the countdown reaches zero; `None` if the waiting room
    /// was left first.
    pub async fn admitted(&self) -> Option<Admission> {
        let mut rx = self.snapshot_rx.clone();
        let res = rx
            .wait_for(|s| s.is_ready || s.has_left)
            .await
            .map(|snapshot| snapshot.is_ready);
        let ready = match res {
            Ok(ready) => ready,
            Err(_) => rx.borrow().is_ready,
        };
        ready.then(|| self.admission.clone())
    }

    /// Deregisters and stops following the roster. Idempotent.
    pub async fn leave_waiting_room(&self) {
        let (reply, rx) = oneshot::channel();
        if self
            .command_tx
            .send(WaitingCommand::Leave { reply })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    /// Waits for admission, then joins the room.
    pub async fn proceed(
        &self,
        deps: RoomDeps,
        config: &ClientConfig,
    ) -> Result<RoomHandle, RoomError> {
        let admission = self.admitted().await.ok_or(RoomError::NotConnected)?;
        RoomSession::join(admission.into(), deps, config).await
    }
}

async fn next_change(subscription: &mut Option<Subscription>) -> Option<ChangeEvent> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => pending().await,
    }
}
