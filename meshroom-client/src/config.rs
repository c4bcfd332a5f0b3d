use serde::{Deserialize, Serialize};

use crate::media::MediaConstraints;
use crate::mesh::MeshConfig;
use crate::transport::TransportConfig;
use crate::waiting::WaitingRoomConfig;

/// Everything a client needs to enter a waiting room and join a mesh.
///
/// Every section has defaults, so `{}` is a valid JSON configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub transport: TransportConfig,
    pub media: MediaConstraints,
    pub waiting: WaitingRoomConfig,
    pub mesh: MeshConfig,
}

impl ClientConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
