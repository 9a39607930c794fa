//! The synchronization engine: shared state, the UI-facing handle and the
//! background scheduler.

mod handle;
mod scheduler;
mod state;

pub use handle::EngineHandle;
pub use scheduler::SyncScheduler;
pub use state::{EngineState, SearchKind, SearchRequest, SharedState, SyncPhase};
