use thiserror::Error;

/// Failures reported by a [`RoomStore`](crate::RoomStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; another writer committed first.
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media device unavailable: {0}")]
    Unavailable(String),

    #[error("track has been stopped")]
    Stopped,

    #[error("media transport error: {0}")]
    Transport(String),
}

/// Errors surfaced to the presentation layer.
#[derive(Debug, Error)]
pub enum RoomError {
    /// Fatal to session initialization; nothing is registered when this is returned.
    #[error("failed to acquire local media: {0}")]
    MediaAcquisition(#[source] MediaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("chat message is empty")]
    EmptyMessage,

    #[error("not connected to the room")]
    NotConnected,

    #[error("room name is required")]
    InvalidRoomName,
}
