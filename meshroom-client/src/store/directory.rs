use meshroom_core::{Room, normalize_room_code};
use tracing::info;

use crate::error::{RoomError, StoreError};
use crate::store::RoomStore;

/// Finds the room whose code matches `room_name`, creating it when missing.
///
/// Codes are upper-cased, so "standup" and "STANDUP" name the same room.
pub async fn join_or_create(store: &dyn RoomStore, room_name: &str) -> Result<Room, RoomError> {
    let room_code = normalize_room_code(room_name);
    if room_code.is_empty() {
        return Err(RoomError::InvalidRoomName);
    }

    if let Some(room) = store.find_room_by_code(&room_code).await? {
        return Ok(room);
    }

    match store.create_room(&room_code, room_name.trim()).await {
        Ok(room) => {
            info!("Created room {} ({})", room.room_code, room.id);
            Ok(room)
        }
        Err(StoreError::Conflict(_)) => store
            .find_room_by_code(&room_code)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("room {room_code}")).into()),
        Err(e) => Err(e.into()),
    }
}
