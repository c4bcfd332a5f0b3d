use anyhow::{Context, Result};
use meshroom_client::{
    ClientConfig, MediaSource, MemoryStore, RoomDeps, RoomHandle, RoomSession, RoomSnapshot,
    TrackMediaSource, JoinParams,
};
use meshroom_core::RoomId;
use std::sync::Arc;
use std::time::Duration;

use super::mock_connection::MockConnectionFactory;

/// Timeout for a snapshot condition to become true (ms).
pub const SNAPSHOT_TIMEOUT_MS: u64 = 5000;

pub struct TestParticipant {
    pub handle: RoomHandle,
    pub connections: MockConnectionFactory,
}

pub fn deps(
    store: &MemoryStore,
    media: Arc<dyn MediaSource>,
    connections: &MockConnectionFactory,
) -> RoomDeps {
    RoomDeps {
        backend: Arc::new(store.clone()),
        media,
        connections: Arc::new(connections.clone()),
    }
}

/// Joins `room_id` with working mock media and transport.
pub async fn join_room(store: &MemoryStore, room_id: RoomId, id: &str, name: &str) -> TestParticipant {
    let connections = MockConnectionFactory::new();
    let params = JoinParams {
        room_id,
        participant_id: id.into(),
        display_name: name.to_string(),
    };

    let handle = RoomSession::join(
        params,
        deps(store, Arc::new(TrackMediaSource), &connections),
        &ClientConfig::default(),
    )
    .await
    .unwrap_or_else(|e| panic!("{id} failed to join: {e}"));

    TestParticipant {
        handle,
        connections,
    }
}

/// Waits until `pred` holds for `handle`'s snapshot.
pub async fn wait_for(
    handle: &RoomHandle,
    what: &str,
    pred: impl FnMut(&RoomSnapshot) -> bool,
) -> Result<RoomSnapshot> {
    tokio::time::timeout(
        Duration::from_millis(SNAPSHOT_TIMEOUT_MS),
        handle.wait_until(pred),
    )
    .await
    .with_context(|| format!("Timeout waiting for {what}"))?
    .with_context(|| format!("Session ended while waiting for {what}"))
}

/// Both sides of every link report `Connected`.
pub fn all_connected(snapshot: &RoomSnapshot, remotes: usize) -> bool {
    snapshot.remote_count() == remotes
        && snapshot
            .participants
            .iter()
            .filter(|p| !p.is_local)
            .all(|p| p.state == Some(meshroom_client::LinkState::Connected))
}
