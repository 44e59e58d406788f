// ============================================================================
// spark-tree - Values
// Raw data held by a tree, and the paths that address it
// ============================================================================

mod path;
mod raw;

pub use path::{Path, Seg};
pub use raw::{classify, List, Map, Value};
