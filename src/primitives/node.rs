// ============================================================================
// spark-tree - Node
// An immutable accessor over one position in the tree
// ============================================================================
//
// A node mirrors its raw value: one child node per list index or map key,
// built recursively at construction. Nodes are never edited after they are
// built. When a mutation touches a path, the resolver builds a fresh node for
// the target and shallow-clones every ancestor with one child swapped, so
// everything off the path keeps its identity.
//
// The mutation methods (set/update/push) only queue work on the owning tree.
// Nothing changes until the tree processes its batch.
// ============================================================================

use std::fmt;
use std::ops::Index;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::core::constants::{DETACHED_NODE_WARNING, INVALID_PUSH_WARNING};
use crate::core::error::{TreeError, TreeResult};
use crate::core::types::Kind;
use crate::primitives::tree::{Tree, TreeInner};
use crate::reactivity::batching::Mutation;
use crate::value::{classify, Path, Seg, Value};

// =============================================================================
// NODE INNER
// =============================================================================

/// Child nodes, shaped like the raw container they mirror.
#[derive(Clone)]
enum Children {
    None,
    List(Vec<Node>),
    Map(IndexMap<String, Node>),
}

/// Cloning a `NodeInner` is the shallow clone used for rewrapping: child
/// handles are copied, the children themselves are shared.
#[derive(Clone)]
struct NodeInner {
    /// Owning tree, used to queue mutations
    tree: Weak<TreeInner>,

    /// Segments from the root to this node
    path: Path,

    /// The raw subtree at `path` (same container identity as the raw data)
    value: Value,

    /// Cached classification of `value`
    kind: Kind,

    children: Children,
}

// =============================================================================
// NODE
// =============================================================================

/// A handle to one position in a [`Tree`].
///
/// Cloning a `Node` clones the handle; use [`Node::ptr_eq`] to check whether
/// two handles are the same node. After a batch is processed, every node on a
/// mutated path is a new node, and every other node is the very same one.
///
/// # Example
///
/// ```
/// use spark_tree::{tick, Node, Tree};
/// use serde_json::json;
///
/// let tree = Tree::from_json(json!({ "user": { "name": "foo" }, "server": { "busy": false } }));
/// let before = tree.root();
///
/// before["user"]["name"].set("bar");
/// tick();
///
/// let after = tree.root();
/// assert_eq!(after["user"]["name"].value().as_str(), Some("bar"));
/// assert!(!Node::ptr_eq(&before, &after));
/// assert!(!Node::ptr_eq(&before["user"], &after["user"]));
/// assert!(Node::ptr_eq(&before["server"], &after["server"]));
/// ```
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

impl Node {
    /// Build a node for `value` at `path`, recursively mirroring its children.
    pub(crate) fn build(tree: &Weak<TreeInner>, value: Value, path: Path) -> Node {
        let kind = classify(&value);
        let children = match &value {
            Value::List(list) => Children::List(
                list.to_vec()
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| Node::build(tree, item, path.child(Seg::Index(i))))
                    .collect(),
            ),
            Value::Map(map) => Children::Map(
                map.entries()
                    .into_iter()
                    .map(|(key, item)| {
                        let child_path = path.child(Seg::Key(key.clone()));
                        (key, Node::build(tree, item, child_path))
                    })
                    .collect(),
            ),
            _ => Children::None,
        };

        Node {
            inner: Rc::new(NodeInner {
                tree: tree.clone(),
                path,
                value,
                kind,
                children,
            }),
        }
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    /// The raw subtree at this position. Not a copy: containers are the very
    /// ones stored in the tree.
    pub fn value(&self) -> &Value {
        &self.inner.value
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Classification cached when the node was built.
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// Number of child nodes.
    pub fn len(&self) -> usize {
        match &self.inner.children {
            Children::None => 0,
            Children::List(items) => items.len(),
            Children::Map(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The child at `seg`, if any.
    pub fn get(&self, seg: impl Into<Seg>) -> Option<&Node> {
        match (&self.inner.children, seg.into()) {
            (Children::List(items), Seg::Index(i)) => items.get(i),
            (Children::Map(entries), Seg::Key(k)) => entries.get(&k),
            _ => None,
        }
    }

    /// The descendant at `path`, relative to this node.
    pub fn at(&self, path: &Path) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, seg| node.get(seg.clone()))
    }

    /// Child segments in order: indices for lists, keys for maps.
    pub fn keys(&self) -> Vec<Seg> {
        match &self.inner.children {
            Children::None => Vec::new(),
            Children::List(items) => (0..items.len()).map(Seg::Index).collect(),
            Children::Map(entries) => entries.keys().map(Seg::from).collect(),
        }
    }

    /// Child segments paired with their nodes, in order.
    pub fn children(&self) -> Vec<(Seg, &Node)> {
        match &self.inner.children {
            Children::None => Vec::new(),
            Children::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, node)| (Seg::Index(i), node))
                .collect(),
            Children::Map(entries) => entries
                .iter()
                .map(|(k, node)| (Seg::from(k), node))
                .collect(),
        }
    }

    /// Deep copy of the current value.
    pub fn to_json(&self) -> serde_json::Value {
        self.inner.value.to_json()
    }

    /// The owning tree, if it is still alive.
    pub fn tree(&self) -> Option<Tree> {
        self.inner.tree.upgrade().map(Tree::from_inner)
    }

    /// Same node?
    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    // =========================================================================
    // MUTATIONS (queued)
    // =========================================================================

    /// Queue replacing this position with `value`.
    pub fn set(&self, value: impl Into<Value>) {
        self.enqueue(Mutation::set(self.path().clone(), value.into()));
    }

    /// Queue replacing this position with `f(current)`.
    ///
    /// `f` runs once, when the batch is processed, and sees the live value at
    /// that moment, including earlier mutations from the same batch.
    ///
    /// ```
    /// use spark_tree::{tick, Tree};
    /// use serde_json::json;
    ///
    /// let tree = Tree::from_json(json!({ "count": 1 }));
    /// tree.root()["count"].set(10);
    /// tree.root()["count"].update(|v| (v.as_i64().unwrap_or(0) + 1).into());
    /// tick();
    /// assert_eq!(tree.root()["count"].value().as_i64(), Some(11));
    /// ```
    pub fn update(&self, f: impl FnOnce(&Value) -> Value + 'static) {
        self.enqueue(Mutation::update(
            self.path().clone(),
            Box::new(move |current| Ok(f(current))),
        ));
    }

    /// Like [`Node::update`], but `f` may fail.
    ///
    /// An `Err` skips only this mutation and is reported to the tree's error
    /// listeners as [`TreeError::UpdateFailed`].
    pub fn try_update<E>(&self, f: impl FnOnce(&Value) -> Result<Value, E> + 'static)
    where
        E: fmt::Display + 'static,
    {
        self.enqueue(Mutation::update(
            self.path().clone(),
            Box::new(move |current| f(current).map_err(|e| e.to_string())),
        ));
    }

    /// Queue appending `item` to this list.
    ///
    /// On a node that is not a list this queues nothing: a warning is logged
    /// and [`TreeError::InvalidPushTarget`] goes to the error listeners.
    pub fn push(&self, item: impl Into<Value>) {
        match self.inner.kind {
            Kind::List => self.enqueue(Mutation::push(self.path().clone(), item.into())),
            found => {
                tracing::warn!(path = %self.path(), %found, "{}", INVALID_PUSH_WARNING);
                if let Some(tree) = self.inner.tree.upgrade() {
                    tree.report(&TreeError::invalid_push_target(self.path().clone(), found));
                }
            }
        }
    }

    fn enqueue(&self, mutation: Mutation) {
        match self.inner.tree.upgrade() {
            Some(tree) => tree.enqueue(mutation),
            None => {
                tracing::warn!(path = %mutation.path, kind = %mutation.kind(), "{}", DETACHED_NODE_WARNING)
            }
        }
    }

    // =========================================================================
    // COPY-ON-WRITE
    // =========================================================================

    /// A shallow clone with the child at `seg` replaced (or added at the end).
    ///
    /// An index may address an existing child or the slot right after the
    /// last one.
    pub(crate) fn with_child(&self, seg: &Seg, child: Node) -> TreeResult<Node> {
        let mut inner = (*self.inner).clone();
        match (&mut inner.children, seg) {
            (Children::List(items), Seg::Index(i)) => {
                let len = items.len();
                match (*i).cmp(&len) {
                    std::cmp::Ordering::Less => items[*i] = child,
                    std::cmp::Ordering::Equal => items.push(child),
                    std::cmp::Ordering::Greater => {
                        return Err(TreeError::index_out_of_bounds(self.path().clone(), *i, len));
                    }
                }
            }
            (Children::Map(entries), Seg::Key(k)) => {
                entries.insert(k.clone(), child);
            }
            _ => {
                return Err(TreeError::type_mismatch(
                    self.path().clone(),
                    expected_kind(seg),
                    self.kind(),
                ));
            }
        }
        Ok(Node {
            inner: Rc::new(inner),
        })
    }
}

/// The container kind a segment can address.
pub(crate) fn expected_kind(seg: &Seg) -> Kind {
    match seg {
        Seg::Key(_) => Kind::Map,
        Seg::Index(_) => Kind::List,
    }
}

impl Index<&str> for Node {
    type Output = Node;

    /// # Panics
    ///
    /// Panics if there is no child under `key`. Use [`Node::get`] to check.
    fn index(&self, key: &str) -> &Node {
        match self.get(key) {
            Some(node) => node,
            None => panic!("no child {:?} at {}", key, self.path()),
        }
    }
}

impl Index<usize> for Node {
    type Output = Node;

    /// # Panics
    ///
    /// Panics if there is no child at `index`. Use [`Node::get`] to check.
    fn index(&self, index: usize) -> &Node {
        match self.get(index) {
            Some(node) => node,
            None => panic!("no child [{}] at {}", index, self.path()),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.inner.path.to_string())
            .field("kind", &self.inner.kind)
            .field("value", &self.inner.value)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
