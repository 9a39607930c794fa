//! Known API instances: directory parsing, health, bans and selection.

pub mod directory;
mod models;
mod registry;

pub use models::Instance;
pub use registry::InstanceRegistry;
