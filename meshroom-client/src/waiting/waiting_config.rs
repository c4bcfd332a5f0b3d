use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WaitingRoomConfig {
    /// How long a session waits before it starts.
    pub wait_seconds: u64,
    /// How often the countdown is recomputed.
    pub tick_millis: u64,
}

impl WaitingRoomConfig {
    pub fn wait_duration(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

impl Default for WaitingRoomConfig {
    fn default() -> Self {
        Self {
            wait_seconds: 120,
            tick_millis: 1000,
        }
    }
}
