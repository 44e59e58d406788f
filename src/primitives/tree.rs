// ============================================================================
// spark-tree - Tree
// Owns the data, the root node, the mutation queue and the listeners
// ============================================================================
//
// Lifecycle of a batch:
//
// 1. set/update/push append a record; the first record arms the scheduler
// 2. the scheduler runs the pass on the next tick
// 3. the pass drains the queue in FIFO order, replacing the root once per
//    resolved record, reporting failed records to the error listeners
// 4. update listeners are called once
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::error::TreeError;
use crate::core::types::{ErrorListener, UpdateListener};
use crate::primitives::listeners::ListenerRegistry;
use crate::primitives::node::Node;
use crate::reactivity::batching::{Mutation, MutationQueue};
use crate::reactivity::resolve::resolve;
use crate::reactivity::scheduling::{Scheduler, TickScheduler};
use crate::value::{Path, Value};

// =============================================================================
// OPTIONS
// =============================================================================

/// Options for [`Tree::with_options`].
#[derive(Clone)]
pub struct TreeOptions {
    /// Where deferred batch passes go. Defaults to [`TickScheduler`].
    pub scheduler: Rc<dyn Scheduler>,
}

impl TreeOptions {
    pub fn with_scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Rc::new(scheduler);
        self
    }
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            scheduler: Rc::new(TickScheduler),
        }
    }
}

impl fmt::Debug for TreeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeOptions").finish_non_exhaustive()
    }
}

// =============================================================================
// TREE INNER
// =============================================================================

pub(crate) struct TreeInner {
    /// Current root; replaced by every resolved record
    root: RefCell<Node>,

    /// Pending records and the scheduled flag
    queue: MutationQueue,

    /// Called once per processed batch
    update_listeners: ListenerRegistry<dyn Fn()>,

    /// Called once per failed record
    error_listeners: ListenerRegistry<dyn Fn(&TreeError)>,

    scheduler: Rc<dyn Scheduler>,

    /// Number of batches processed so far
    batches: Cell<u64>,

    /// Set while a pass is draining the queue
    processing: Cell<bool>,
}

impl TreeInner {
    /// Append a record, arming the scheduler if this starts a new batch.
    pub(crate) fn enqueue(self: &Rc<Self>, mutation: Mutation) {
        tracing::trace!(kind = %mutation.kind(), path = %mutation.path, "mutation queued");
        if self.queue.enqueue(mutation) {
            self.schedule_pass();
        }
    }

    /// Hand one pass to the scheduler. The task only holds a weak handle.
    fn schedule_pass(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.scheduler.schedule(Box::new(move || {
            if let Some(tree) = weak.upgrade() {
                tree.run_scheduled_pass();
            }
        }));
    }

    /// Deliver `err` to the error listeners.
    pub(crate) fn report(&self, err: &TreeError) {
        tracing::warn!(error = %err, "mutation failed");
        for listener in self.error_listeners.snapshot() {
            listener(err);
        }
    }

    /// Entry point of a scheduled pass. A pass whose batch was already
    /// processed by `Tree::flush` finds the flag cleared and does nothing.
    fn run_scheduled_pass(self: &Rc<Self>) {
        if self.queue.is_scheduled() {
            self.process_queue();
        }
    }

    /// Drain the queue, then notify update listeners once.
    fn process_queue(self: &Rc<Self>) {
        // Records queued by update functions are drained by the running pass
        if self.processing.replace(true) {
            return;
        }

        // Records left behind by a panicking update function get a new pass
        struct ProcessingGuard<'a>(&'a Rc<TreeInner>);

        impl Drop for ProcessingGuard<'_> {
            fn drop(&mut self) {
                let tree = self.0;
                tree.processing.set(false);
                if tree.queue.len() > 0 && tree.queue.arm() {
                    tree.schedule_pass();
                }
            }
        }

        let guard = ProcessingGuard(self);

        self.queue.begin_pass();
        let weak = Rc::downgrade(self);
        let (mut resolved, mut failed) = (0usize, 0usize);

        while let Some(mutation) = self.queue.pop() {
            let kind = mutation.kind();
            let path = mutation.path.clone();
            let root = self.root.borrow().clone();

            match resolve(&weak, &root, mutation) {
                Ok(next) => {
                    *self.root.borrow_mut() = next;
                    resolved += 1;
                    tracing::trace!(%kind, %path, "mutation resolved");
                }
                Err(err) => {
                    failed += 1;
                    self.report(&err);
                }
            }
        }

        drop(guard);

        let batch = self.batches.get() + 1;
        self.batches.set(batch);
        tracing::debug!(batch, resolved, failed, "batch processed");

        for listener in self.update_listeners.snapshot() {
            listener();
        }
    }
}

// =============================================================================
// TREE
// =============================================================================

/// An observable tree store.
///
/// Mutations are queued through nodes (or the `*_at` methods) and applied
/// together on the next tick. Each processed batch replaces the root and
/// every node along the mutated paths; everything else is shared with the
/// previous root.
///
/// # Example
///
/// ```
/// use spark_tree::{tick, Tree};
/// use serde_json::json;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let tree = Tree::from_json(json!({ "a": 0, "b": 0 }));
/// let calls = Rc::new(Cell::new(0));
/// let calls_clone = calls.clone();
/// tree.on_update(move || calls_clone.set(calls_clone.get() + 1));
///
/// let root = tree.root();
/// root["a"].set(1);
/// root["b"].set(2);
/// tick();
///
/// assert_eq!(calls.get(), 1);
/// assert_eq!(tree.to_json(), json!({ "a": 1, "b": 2 }));
/// ```
#[derive(Clone)]
pub struct Tree {
    inner: Rc<TreeInner>,
}

impl Tree {
    /// Build a tree over a deep copy of `data`.
    ///
    /// Containers the caller still holds are never shared with the tree, so
    /// the only way to change the tree's data is through its mutations.
    pub fn new(data: impl Into<Value>) -> Self {
        Self::with_options(data, TreeOptions::default())
    }

    /// Build a tree from a JSON document.
    pub fn from_json(data: serde_json::Value) -> Self {
        Self::build(Value::from(data), TreeOptions::default())
    }

    /// Like [`Tree::new`], with options.
    pub fn with_options(data: impl Into<Value>, options: TreeOptions) -> Self {
        Self::build(data.into().deep_copy(), options)
    }

    /// `value` must not be reachable from outside the tree.
    fn build(value: Value, options: TreeOptions) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<TreeInner>| TreeInner {
            root: RefCell::new(Node::build(weak, value, Path::root())),
            queue: MutationQueue::new(),
            update_listeners: ListenerRegistry::new(),
            error_listeners: ListenerRegistry::new(),
            scheduler: options.scheduler,
            batches: Cell::new(0),
            processing: Cell::new(false),
        });
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Rc<TreeInner>) -> Self {
        Self { inner }
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    /// The current root node.
    pub fn root(&self) -> Node {
        self.inner.root.borrow().clone()
    }

    /// The current root raw value.
    pub fn value(&self) -> Value {
        self.inner.root.borrow().value().clone()
    }

    /// Deep copy of the current data.
    pub fn to_json(&self) -> serde_json::Value {
        self.inner.root.borrow().to_json()
    }

    /// The node at `path` in the current root.
    pub fn at(&self, path: &Path) -> Option<Node> {
        self.inner.root.borrow().at(path).cloned()
    }

    // =========================================================================
    // PATH-ADDRESSED MUTATIONS
    // =========================================================================

    /// Queue a set at `path`. Unlike [`Node::set`], the target need not exist
    /// yet: a missing map key is created, and a list index equal to the
    /// length appends.
    pub fn set_at(&self, path: Path, value: impl Into<Value>) {
        self.inner.enqueue(Mutation::set(path, value.into()));
    }

    /// Queue an update at `path`. See [`Node::update`].
    pub fn update_at(&self, path: Path, f: impl FnOnce(&Value) -> Value + 'static) {
        self.inner
            .enqueue(Mutation::update(path, Box::new(move |current| Ok(f(current)))));
    }

    /// Queue a fallible update at `path`. See [`Node::try_update`].
    pub fn try_update_at<E>(&self, path: Path, f: impl FnOnce(&Value) -> Result<Value, E> + 'static)
    where
        E: fmt::Display + 'static,
    {
        self.inner.enqueue(Mutation::update(
            path,
            Box::new(move |current| f(current).map_err(|e| e.to_string())),
        ));
    }

    /// Queue a push at `path`. See [`Node::push`].
    ///
    /// If no node exists at `path` yet the push is still queued, and fails at
    /// processing time unless an earlier record in the batch creates a list there.
    pub fn push_at(&self, path: Path, item: impl Into<Value>) {
        match self.at(&path) {
            Some(node) => node.push(item),
            None => self.inner.enqueue(Mutation::push(path, item.into())),
        }
    }

    // =========================================================================
    // LISTENERS
    // =========================================================================

    /// Register a callback for processed batches. Duplicates are allowed.
    pub fn add_update_listener(&self, listener: UpdateListener) {
        self.inner.update_listeners.add(listener);
    }

    /// Remove the first registration of `listener`, or all update listeners
    /// when `None`. Returns whether anything was removed.
    pub fn remove_update_listener(&self, listener: Option<&UpdateListener>) -> bool {
        self.inner.update_listeners.remove(listener)
    }

    /// Register `f` and return its handle for later removal.
    pub fn on_update(&self, f: impl Fn() + 'static) -> UpdateListener {
        let listener: UpdateListener = Rc::new(f);
        self.add_update_listener(listener.clone());
        listener
    }

    /// Register a callback for failed mutations.
    pub fn add_error_listener(&self, listener: ErrorListener) {
        self.inner.error_listeners.add(listener);
    }

    /// Remove the first registration of `listener`, or all error listeners
    /// when `None`.
    pub fn remove_error_listener(&self, listener: Option<&ErrorListener>) -> bool {
        self.inner.error_listeners.remove(listener)
    }

    /// Register `f` for failed mutations and return its handle.
    pub fn on_error(&self, f: impl Fn(&TreeError) + 'static) -> ErrorListener {
        let listener: ErrorListener = Rc::new(f);
        self.add_error_listener(listener.clone());
        listener
    }

    // =========================================================================
    // BATCH STATE
    // =========================================================================

    /// Number of queued, unprocessed records.
    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    /// Whether a pass is waiting on the scheduler.
    pub fn is_scheduled(&self) -> bool {
        self.inner.queue.is_scheduled()
    }

    /// Number of batches processed so far.
    pub fn batch_count(&self) -> u64 {
        self.inner.batches.get()
    }

    /// Process the pending batch now instead of on the next tick.
    ///
    /// The pass already handed to the scheduler is skipped when it runs.
    /// Does nothing when there is no pending batch.
    pub fn flush(&self) {
        if self.inner.queue.is_scheduled() || self.inner.queue.len() > 0 {
            self.inner.process_queue();
        }
    }

    /// Same tree?
    pub fn ptr_eq(a: &Tree, b: &Tree) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("value", &self.value())
            .field("pending", &self.inner.queue.len())
            .field("scheduled", &self.inner.queue.is_scheduled())
            .field("batches", &self.inner.batches.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
