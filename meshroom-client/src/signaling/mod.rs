mod signaling_output;
mod store_signaling;

pub use signaling_output::*;
pub use store_signaling::*;
