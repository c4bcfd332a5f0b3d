use meshroom_core::ChatMessage;

use crate::mesh::ParticipantView;

/// What the presentation layer renders, republished after every change.
#[derive(Debug, Clone, Default)]
pub struct RoomSnapshot {
    pub participants: Vec<ParticipantView>,
    pub messages: Vec<ChatMessage>,
    pub is_connected: bool,
    pub is_audio_enabled: bool,
    pub is_video_enabled: bool,
    pub is_screen_sharing: bool,
}

impl RoomSnapshot {
    pub fn remote_count(&self) -> usize {
        self.participants.iter().filter(|p| !p.is_local).count()
    }
}
