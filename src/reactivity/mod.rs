// ============================================================================
// spark-tree - Reactivity Module
// Mutation batching, resolution and deferred scheduling
// ============================================================================

pub(crate) mod batching;
pub(crate) mod resolve;
pub mod scheduling;

// Re-export scheduling functions
pub use scheduling::{defer, flush, pending_tasks, tick, Scheduler, TickScheduler};
