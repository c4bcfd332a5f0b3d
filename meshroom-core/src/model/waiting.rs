use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::participant::ParticipantId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WaitingEntry {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
}
