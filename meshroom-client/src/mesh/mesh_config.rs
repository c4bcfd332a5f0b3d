use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MeshConfig {
    /// Remote candidates kept per participant while no description is applied yet.
    pub max_buffered_candidates: usize,
    pub event_channel_capacity: usize,
    pub command_channel_capacity: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            max_buffered_candidates: 64,
            event_channel_capacity: 256,
            command_channel_capacity: 100,
        }
    }
}
