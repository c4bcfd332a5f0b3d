use async_trait::async_trait;
use meshroom_client::{LocalStream, MediaConstraints, MediaError, MediaSource};

/// A media source whose devices are never available.
#[derive(Clone, Default)]
pub struct FailingMediaSource;

#[async_trait]
impl MediaSource for FailingMediaSource {
    async fn acquire(&self, _constraints: &MediaConstraints) -> Result<LocalStream, MediaError> {
        Err(MediaError::Unavailable("permission denied".to_string()))
    }

    async fn acquire_screen(&self) -> Result<LocalStream, MediaError> {
        Err(MediaError::Unavailable("permission denied".to_string()))
    }
}
