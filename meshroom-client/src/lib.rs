mod config;
mod error;

pub mod link;
pub mod media;
pub mod mesh;
pub mod session;
pub mod signaling;
pub mod store;
pub mod transport;
pub mod waiting;

pub use config::*;
pub use error::*;
pub use link::*;
pub use media::*;
pub use mesh::*;
pub use session::*;
pub use signaling::*;
pub use store::*;
pub use transport::*;
pub use waiting::*;
