// ============================================================================
// spark-tree - Type Definitions
// Shared enums and callback aliases
// ============================================================================

use std::fmt;
use std::rc::Rc;

use super::error::TreeError;
use crate::value::Value;

// =============================================================================
// KIND
// =============================================================================

/// Structural classification of a raw value.
///
/// Decides how a node enumerates children and whether it accepts `push`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Indexed children `0..len`
    List,
    /// Keyed children in insertion order
    Map,
    /// No children
    Leaf,
}

impl Kind {
    /// Lowercase name used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::List => "list",
            Kind::Map => "map",
            Kind::Leaf => "leaf",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// MUTATION KIND
// =============================================================================

/// The three mutation kinds a node can queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Replace the value at a path
    Set,
    /// Replace the value at a path with a function of its live value
    Update,
    /// Append to the list at a path
    Push,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MutationKind::Set => "set",
            MutationKind::Update => "update",
            MutationKind::Push => "push",
        })
    }
}

// =============================================================================
// CALLBACK TYPES
// =============================================================================

/// A deferred unit of work handed to a scheduler.
pub type Task = Box<dyn FnOnce()>;

/// Transform carried by an update record. `Err` fails only that record.
pub type UpdateFn = Box<dyn FnOnce(&Value) -> Result<Value, String>>;

/// Called once per processed batch.
///
/// Kept as an `Rc` so the same handle can later be passed to
/// `Tree::remove_update_listener`.
pub type UpdateListener = Rc<dyn Fn()>;

/// Called once per failed mutation.
pub type ErrorListener = Rc<dyn Fn(&TreeError)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(Kind::List.to_string(), "list");
        assert_eq!(Kind::Map.to_string(), "map");
        assert_eq!(Kind::Leaf.to_string(), "leaf");
    }

    #[test]
    fn mutation_kind_display() {
        assert_eq!(MutationKind::Set.to_string(), "set");
        assert_eq!(MutationKind::Update.to_string(), "update");
        assert_eq!(MutationKind::Push.to_string(), "push");
    }
}
