use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    User,
    Environment,
}

/// Capture request passed to a [`MediaSource`](crate::MediaSource).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
    /// Ideal capture resolution; the device may pick the closest it supports.
    pub width: u32,
    pub height: u32,
    pub facing_mode: FacingMode,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
            width: 1280,
            height: 720,
            facing_mode: FacingMode::User,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}
