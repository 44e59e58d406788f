// ============================================================================
// spark-tree - Core Module
// Shared types, errors, constants and the thread-local tick context
// ============================================================================

pub mod constants;
pub mod context;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use context::{is_flushing, tick_count, with_context, TickContext};
pub use error::{TreeError, TreeResult};
pub use types::{ErrorListener, Kind, MutationKind, Task, UpdateFn, UpdateListener};
