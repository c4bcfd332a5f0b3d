mod clock;
mod countdown;
mod session_resolver;
mod waiting_config;
mod waiting_room;

pub use clock::*;
pub use countdown::*;
pub use session_resolver::*;
pub use waiting_config::*;
pub use waiting_room::*;
