mod chat;
mod participant;
mod room;
mod session;
mod signaling;
mod waiting;

pub use chat::ChatMessage;
pub use participant::{ParticipantId, ParticipantRecord};
pub use room::{Room, RoomId, generate_room_code, normalize_room_code};
pub use session::{Session, SessionStatus};
pub use signaling::{IceServerConfig, SignalEnvelope, SignalKind};
pub use waiting::WaitingEntry;
