// ============================================================================
// spark-tree - Batching
// The pending mutation queue and its single-flight "scheduled" flag
// ============================================================================
//
// Every set/update/push appends one record. The first record of a batch arms
// the scheduler; the rest just queue up behind it. Processing clears the flag
// *before* draining, so a record queued while a batch is being processed arms
// a fresh pass instead of being lost.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

use crate::core::types::{MutationKind, UpdateFn};
use crate::value::{Path, Value};

// =============================================================================
// MUTATION RECORD
// =============================================================================

/// What a record does once resolved.
pub(crate) enum Op {
    Set(Value),
    Update(UpdateFn),
    Push(Value),
}

/// One queued change: kind, target path and argument.
pub(crate) struct Mutation {
    pub path: Path,
    pub op: Op,
}

impl Mutation {
    pub fn set(path: Path, value: Value) -> Self {
        Self {
            path,
            op: Op::Set(value),
        }
    }

    pub fn update(path: Path, f: UpdateFn) -> Self {
        Self {
            path,
            op: Op::Update(f),
        }
    }

    pub fn push(path: Path, item: Value) -> Self {
        Self {
            path,
            op: Op::Push(item),
        }
    }

    pub fn kind(&self) -> MutationKind {
        match self.op {
            Op::Set(_) => MutationKind::Set,
            Op::Update(_) => MutationKind::Update,
            Op::Push(_) => MutationKind::Push,
        }
    }
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Mutation");
        s.field("kind", &self.kind()).field("path", &self.path);
        match &self.op {
            Op::Set(v) | Op::Push(v) => s.field("arg", v),
            Op::Update(_) => s.field("arg", &"<fn>"),
        };
        s.finish()
    }
}

// =============================================================================
// MUTATION QUEUE
// =============================================================================

/// FIFO of pending records plus the "a pass is scheduled" flag.
#[derive(Default)]
pub(crate) struct MutationQueue {
    pending: RefCell<VecDeque<Mutation>>,
    scheduled: Cell<bool>,
}

impl MutationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    ///
    /// Returns true when no pass was scheduled yet; the caller must then
    /// schedule exactly one.
    pub fn enqueue(&self, mutation: Mutation) -> bool {
        self.pending.borrow_mut().push_back(mutation);
        self.arm()
    }

    /// Set the flag without queueing. Returns true when it was clear; the
    /// caller must then schedule a pass.
    pub fn arm(&self) -> bool {
        !self.scheduled.replace(true)
    }

    /// Mark the start of a pass. Returns whether a pass had been scheduled.
    pub fn begin_pass(&self) -> bool {
        self.scheduled.replace(false)
    }

    /// Take the oldest record.
    pub fn pop(&self) -> Option<Mutation> {
        self.pending.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }
}

impl fmt::Debug for MutationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationQueue")
            .field("pending", &*self.pending.borrow())
            .field("scheduled", &self.scheduled.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
