// ============================================================================
// spark-tree - Errors
// Failures reported while a batch of mutations is processed
// ============================================================================

use thiserror::Error;

use super::types::Kind;
use crate::value::Path;

/// Result type alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Why a queued mutation could not be applied.
///
/// Mutation calls never return these directly. They are delivered to the
/// tree's error listeners during the deferred pass and the failing record is
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A segment on the way to the target does not exist.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The path up to and including the missing segment.
        path: Path,
    },

    /// A list index past the end of the list.
    #[error("index {index} out of bounds (len: {len}) at {path}")]
    IndexOutOfBounds {
        /// Path of the list.
        path: Path,
        /// The index that was written.
        index: usize,
        /// Length of the list at resolution time.
        len: usize,
    },

    /// A key segment on a list, an index segment on a map, or any segment on a leaf.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Path of the container being addressed.
        path: Path,
        /// The kind the segment requires.
        expected: Kind,
        /// The kind actually found.
        found: Kind,
    },

    /// `push` on something that is not a list.
    #[error("can't push to non-list node at {path} (found {found})")]
    InvalidPushTarget {
        /// Path of the push target.
        path: Path,
        /// The kind actually found.
        found: Kind,
    },

    /// A fallible update function returned an error.
    #[error("update at {path} failed: {message}")]
    UpdateFailed {
        /// Path of the update target.
        path: Path,
        /// The function's error, rendered with `Display`.
        message: String,
    },
}

impl TreeError {
    #[inline]
    pub fn path_not_found(path: Path) -> Self {
        TreeError::PathNotFound { path }
    }

    #[inline]
    pub fn index_out_of_bounds(path: Path, index: usize, len: usize) -> Self {
        TreeError::IndexOutOfBounds { path, index, len }
    }

    #[inline]
    pub fn type_mismatch(path: Path, expected: Kind, found: Kind) -> Self {
        TreeError::TypeMismatch {
            path,
            expected,
            found,
        }
    }

    #[inline]
    pub fn invalid_push_target(path: Path, found: Kind) -> Self {
        TreeError::InvalidPushTarget { path, found }
    }

    #[inline]
    pub fn update_failed(path: Path, message: impl Into<String>) -> Self {
        TreeError::UpdateFailed {
            path,
            message: message.into(),
        }
    }

    /// The path the failure refers to.
    pub fn path(&self) -> &Path {
        match self {
            TreeError::PathNotFound { path }
            | TreeError::IndexOutOfBounds { path, .. }
            | TreeError::TypeMismatch { path, .. }
            | TreeError::InvalidPushTarget { path, .. }
            | TreeError::UpdateFailed { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn messages_render_paths() {
        let err = TreeError::path_not_found(path!("user", "email"));
        assert_eq!(err.to_string(), "path not found: $.user.email");

        let err = TreeError::index_out_of_bounds(path!("list"), 5, 2);
        assert_eq!(err.to_string(), "index 5 out of bounds (len: 2) at $.list");

        let err = TreeError::type_mismatch(path!("list"), Kind::Map, Kind::List);
        assert_eq!(
            err.to_string(),
            "type mismatch at $.list: expected map, found list"
        );

        let err = TreeError::invalid_push_target(path!("user"), Kind::Map);
        assert_eq!(
            err.to_string(),
            "can't push to non-list node at $.user (found map)"
        );

        let err = TreeError::update_failed(path!("count"), "negative");
        assert_eq!(err.to_string(), "update at $.count failed: negative");
    }

    #[test]
    fn path_accessor() {
        let err = TreeError::update_failed(path!("a", 0), "boom");
        assert_eq!(err.path(), &path!("a", 0));
    }
}
