//! Mirrortube Engine Library
//!
//! Instance-aware synchronization and metadata cache for a federation of
//! independently operated video index mirrors. The library owns instance
//! health and selection, the background refresh scheduler and the video and
//! channel caches; terminal rendering and input live in the embedding host.

pub mod channels;
pub mod config;
pub mod instances;
pub mod prefs;
pub mod sync;
pub mod upstream;
pub mod videos;

// Re-export commonly used types for convenience
pub use prefs::{FilePreferenceStore, PreferenceStore};
pub use sync::{EngineHandle, EngineState, SyncScheduler};
pub use upstream::{HttpTransport, Transport};
