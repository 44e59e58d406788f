// ============================================================================
// spark-tree - Tick Context
// Thread-local state for the default deferred task queue
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::types::Task;

// =============================================================================
// TICK CONTEXT
// =============================================================================

/// Thread-local state behind `TickScheduler`, `tick()` and `flush()`.
///
/// Tasks deferred on a thread only ever run on that thread, when the host
/// drives the queue.
pub struct TickContext {
    /// Tasks waiting for the next tick, in deferral order
    pub tasks: RefCell<VecDeque<Task>>,

    /// Number of ticks that have run on this thread
    pub tick_count: Cell<u64>,

    /// Whether `flush()` is currently draining the queue
    pub is_flushing: Cell<bool>,
}

impl TickContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self {
            tasks: RefCell::new(VecDeque::new()),
            tick_count: Cell::new(0),
            is_flushing: Cell::new(false),
        }
    }

    // =========================================================================
    // TASK QUEUE
    // =========================================================================

    /// Append a task to run on the next tick
    pub fn push_task(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }

    /// Take every queued task, leaving an empty queue behind.
    ///
    /// Tasks deferred while the taken batch runs land in the fresh queue and
    /// wait for the following tick.
    pub fn take_tasks(&self) -> VecDeque<Task> {
        self.tasks.replace(VecDeque::new())
    }

    /// Put `tasks` back at the front of the queue, ahead of anything
    /// deferred since they were taken.
    pub fn requeue_front(&self, mut tasks: VecDeque<Task>) {
        let mut queue = self.tasks.borrow_mut();
        tasks.append(&mut queue);
        *queue = tasks;
    }

    /// Number of tasks waiting for the next tick
    pub fn pending_tasks(&self) -> usize {
        self.tasks.borrow().len()
    }

    // =========================================================================
    // COUNTERS & FLAGS
    // =========================================================================

    /// Increment and return the tick count
    pub fn increment_tick_count(&self) -> u64 {
        let n = self.tick_count.get() + 1;
        self.tick_count.set(n);
        n
    }

    /// Get the tick count
    pub fn get_tick_count(&self) -> u64 {
        self.tick_count.get()
    }

    /// Set flushing mode, returning the previous value
    pub fn set_flushing(&self, value: bool) -> bool {
        self.is_flushing.replace(value)
    }

    /// Check if `flush()` is running
    pub fn is_flushing(&self) -> bool {
        self.is_flushing.get()
    }
}

impl Default for TickContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// THREAD-LOCAL ACCESS
// =============================================================================

thread_local! {
    /// The thread-local tick context
    static CONTEXT: TickContext = TickContext::new();
}

/// Access the thread-local tick context.
///
/// Do not run user code inside the closure: a task that defers another task
/// would re-borrow the queue.
pub fn with_context<R>(f: impl FnOnce(&TickContext) -> R) -> R {
    CONTEXT.with(f)
}

/// Number of ticks that have run on this thread
pub fn tick_count() -> u64 {
    with_context(|ctx| ctx.get_tick_count())
}

/// Check if `flush()` is currently running on this thread
pub fn is_flushing() -> bool {
    with_context(|ctx| ctx.is_flushing())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn context_creation() {
        let ctx = TickContext::new();
        assert_eq!(ctx.pending_tasks(), 0);
        assert_eq!(ctx.get_tick_count(), 0);
        assert!(!ctx.is_flushing());
    }

    #[test]
    fn take_tasks_leaves_fresh_queue() {
        let ctx = TickContext::new();
        let hits = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let hits = hits.clone();
            ctx.push_task(Box::new(move || hits.set(hits.get() + 1)));
        }
        assert_eq!(ctx.pending_tasks(), 3);

        let taken = ctx.take_tasks();
        assert_eq!(taken.len(), 3);
        assert_eq!(ctx.pending_tasks(), 0);

        for task in taken {
            task();
        }
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn requeue_front_goes_ahead_of_new_tasks() {
        let ctx = TickContext::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let task = |id: u32| -> Task {
            let order = order.clone();
            Box::new(move || order.borrow_mut().push(id))
        };

        ctx.push_task(task(1));
        ctx.push_task(task(2));
        let taken = ctx.take_tasks();
        ctx.push_task(task(3));
        ctx.requeue_front(taken);

        for task in ctx.take_tasks() {
            task();
        }
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn tick_counter() {
        let ctx = TickContext::new();
        assert_eq!(ctx.increment_tick_count(), 1);
        assert_eq!(ctx.increment_tick_count(), 2);
        assert_eq!(ctx.get_tick_count(), 2);
    }

    #[test]
    fn flushing_flag() {
        let ctx = TickContext::new();
        assert!(!ctx.set_flushing(true));
        assert!(ctx.is_flushing());
        assert!(ctx.set_flushing(false));
        assert!(!ctx.is_flushing());
    }
}
