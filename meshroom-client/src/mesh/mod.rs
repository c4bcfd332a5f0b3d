mod mesh_config;
mod mesh_manager;
mod roster;

pub use mesh_config::*;
pub use mesh_manager::*;
pub use roster::*;
