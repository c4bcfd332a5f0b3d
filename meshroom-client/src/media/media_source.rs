use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::error::MediaError;
use crate::media::{LocalStream, LocalTrack, MediaConstraints, TrackSource};

/// Acquires local capture streams.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalStream, MediaError>;

    async fn acquire_screen(&self) -> Result<LocalStream, MediaError>;
}

/// Hands out sample-fed tracks; the embedder's capture pipeline pushes encoded
/// frames into them through [`LocalTrack::write_frame`].
#[derive(Debug, Clone, Default)]
pub struct TrackMediaSource;

#[async_trait]
impl MediaSource for TrackMediaSource {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalStream, MediaError> {
        if !constraints.audio && !constraints.video {
            return Err(MediaError::Unavailable(
                "neither audio nor video requested".to_owned(),
            ));
        }

        let stream_id = Uuid::new_v4().to_string();
        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(LocalTrack::new(TrackSource::Microphone, &stream_id));
        }
        if constraints.video {
            tracks.push(LocalTrack::new(TrackSource::Camera, &stream_id));
        }

        info!(
            "Local media acquired: {} track(s), {}x{}",
            tracks.len(),
            constraints.width,
            constraints.height
        );
        Ok(LocalStream::new(stream_id, tracks))
    }

    async fn acquire_screen(&self) -> Result<LocalStream, MediaError> {
        let stream_id = Uuid::new_v4().to_string();
        let track = LocalTrack::new(TrackSource::Screen, &stream_id);
        Ok(LocalStream::new(stream_id, vec![track]))
    }
}
