mod chat_log;
mod room_command;
mod room_handle;
mod room_session;
mod room_snapshot;

pub use chat_log::*;
pub use room_command::*;
pub use room_handle::*;
pub use room_session::*;
pub use room_snapshot::*;
