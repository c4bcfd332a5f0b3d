use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::room::RoomId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Waiting,
    Active,
}

/// The single discussion session of a room.
///
/// `started_at` is fixed by whichever creation attempt the store commits first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub room_id: RoomId,
    pub started_at: DateTime<Utc>,
    pub status: SessionStatus,
}
