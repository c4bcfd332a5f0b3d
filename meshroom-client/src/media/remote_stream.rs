use std::fmt;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

use crate::media::TrackKind;

/// A track the remote side sends us.
///
/// `handle` is the live track for renderers; transports that do not carry
/// real media leave it empty.
#[derive(Clone)]
pub struct RemoteTrack {
    pub track_id: String,
    pub stream_id: String,
    pub kind: TrackKind,
    pub handle: Option<Arc<TrackRemote>>,
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("track_id", &self.track_id)
            .field("stream_id", &self.stream_id)
            .field("kind", &self.kind)
            .field("live", &self.handle.is_some())
            .finish()
    }
}

/// Media received from one remote participant.
#[derive(Debug, Clone, Default)]
pub struct RemoteStream {
    tracks: Vec<RemoteTrack>,
}

impl RemoteStream {
    /// Adds `track`, replacing a previous track with the same id.
    pub fn add_track(&mut self, track: RemoteTrack) {
        self.tracks.retain(|t| t.track_id != track.track_id);
        self.tracks.push(track);
    }

    pub fn tracks(&self) -> &[RemoteTrack] {
        &self.tracks
    }

    pub fn has_kind(&self, kind: TrackKind) -> bool {
        self.tracks.iter().any(|t| t.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
