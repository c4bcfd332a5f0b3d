use tokio::sync::oneshot;

use crate::error::RoomError;

/// Requests from the presentation layer to the room event loop.
#[derive(Debug)]
pub enum RoomCommand {
    /// Replies with the new enablement.
    ToggleAudio { reply: oneshot::Sender<bool> },

    ToggleVideo { reply: oneshot::Sender<bool> },

    /// `text` is already trimmed and non-empty.
    SendChat {
        text: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    ShareScreen {
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    StopScreenShare { reply: oneshot::Sender<()> },

    /// Tear the session down; the loop exits after replying.
    Leave { reply: oneshot::Sender<()> },
}
