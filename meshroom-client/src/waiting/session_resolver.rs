use chrono::{DateTime, Utc};
use meshroom_core::{RoomId, Session};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::RoomStore;

/// Returns the room's discussion session, creating it with `started_at = now`
/// if nobody has yet.
///
/// Concurrent callers race on the create; losers read back the winner's row,
/// so everyone counts down from the same `started_at`.
pub async fn resolve_session(
    store: &dyn RoomStore,
    room_id: RoomId,
    now: DateTime<Utc>,
) -> Result<Session, StoreError> {
    match store.create_session(room_id, now).await {
        Ok(session) => {
            info!("Started session for room {} at {}", room_id, session.started_at);
            Ok(session)
        }
        Err(StoreError::Conflict(_)) => {
            debug!("Session for room {} already exists, reading it", room_id);
            store
                .get_session(room_id)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("session for room {room_id}")))
        }
        Err(e) => Err(e),
    }
}
