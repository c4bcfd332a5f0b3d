mod link_event;
mod link_state;
mod peer_link;

pub use link_event::*;
pub use link_state::*;
pub use peer_link::*;
