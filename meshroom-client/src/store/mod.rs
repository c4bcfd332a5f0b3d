mod directory;
mod memory_store;
mod realtime;
mod room_store;

pub use directory::*;
pub use memory_store::*;
pub use realtime::*;
pub use room_store::*;
