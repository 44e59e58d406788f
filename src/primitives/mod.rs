// ============================================================================
// spark-tree - Primitives
// The public handles: trees, nodes and listener registries
// ============================================================================

pub mod listeners;
pub mod node;
pub mod tree;

pub use listeners::ListenerRegistry;
pub use node::Node;
pub use tree::{Tree, TreeOptions};
