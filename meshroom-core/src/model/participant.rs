use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::room::RoomId;

const ID_PREFIX: &str = "user_";
const ID_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque participant identifier, stable for the lifetime of one session.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Generates a fresh id of the form `user_xxxxxxxxx`.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ID_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("{ID_PREFIX}{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Presence row of a participant in a live room.
///
/// `join_order` is assigned by the store and strictly increases with every new
/// registration in the room; it decides which side of a pair initiates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantRecord {
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub join_order: u64,
    pub joined_at: DateTime<Utc>,
}
