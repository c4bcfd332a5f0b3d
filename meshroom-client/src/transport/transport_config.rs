use meshroom_core::IceServerConfig;
use serde::{Deserialize, Serialize};

/// ICE configuration handed to every peer connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                IceServerConfig::stun("stun:stun.l.google.com:19302"),
                IceServerConfig::stun("stun:stun1.l.google.com:19302"),
            ],
        }
    }
}
