// ============================================================================
// spark-tree - Constants
// ============================================================================

// =============================================================================
// SCHEDULING
// =============================================================================

/// Maximum number of ticks `flush()` runs before assuming a task keeps
/// rescheduling itself forever.
pub const MAX_FLUSH_COUNT: u32 = 1000;

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// Message logged when `push` is called on a node that does not hold a list.
pub const INVALID_PUSH_WARNING: &str = "can't push to a non-list tree node";

/// Message logged when a node outlives the tree that created it.
pub const DETACHED_NODE_WARNING: &str = "mutation ignored: owning tree was dropped";
