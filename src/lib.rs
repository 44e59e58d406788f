// ============================================================================
// spark-tree - An Observable Copy-on-Write Tree Store
// ============================================================================
//
// Wraps nested data in a parallel tree of immutable nodes. Mutations are
// queued against paths, applied together once per tick, and only the nodes
// on each mutated path are replaced. Unchanged branches keep their identity,
// so consumers can detect change with a pointer comparison.
// ============================================================================

#[macro_use]
mod macros;

pub mod core;
pub mod primitives;
pub mod reactivity;
pub mod value;

// Re-export core items at crate root for ergonomic access
pub use core::constants;
pub use core::context::{is_flushing, tick_count, with_context, TickContext};
pub use core::error::{TreeError, TreeResult};
pub use core::types::{ErrorListener, Kind, MutationKind, Task, UpdateFn, UpdateListener};

// Re-export primitives
pub use primitives::listeners::ListenerRegistry;
pub use primitives::node::Node;
pub use primitives::tree::{Tree, TreeOptions};

// Re-export scheduling
pub use reactivity::scheduling::{defer, flush, pending_tasks, tick, Scheduler, TickScheduler};

// Re-export values
pub use value::{classify, List, Map, Path, Seg, Value};

// =============================================================================
// TESTS
// =============================================================================
