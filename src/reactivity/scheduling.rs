// ============================================================================
// spark-tree - Scheduling
// Deferring batch processing until the current synchronous work is done
// ============================================================================
//
// Rust has no ambient event loop, so "next tick" is an explicit task queue.
// The default `TickScheduler` defers onto a thread-local queue and the host
// decides when a tick happens:
//
// - tick():  run the tasks that were queued before the call
// - flush(): tick until nothing is left, with loop detection
//
// Hosts that already own an event loop implement `Scheduler` and forward the
// task to it.
// ============================================================================

use std::collections::VecDeque;
use std::fmt;

use crate::core::constants::MAX_FLUSH_COUNT;
use crate::core::context::with_context;
use crate::core::types::Task;

// =============================================================================
// SCHEDULER
// =============================================================================

/// Runs a task later, after the caller's synchronous work has unwound.
///
/// Implementations must never run `task` from inside `schedule` itself;
/// batching relies on every mutation of the current turn being queued before
/// the task runs.
pub trait Scheduler {
    fn schedule(&self, task: Task);
}

/// The default scheduler: defers onto this thread's tick queue.
#[derive(Clone, Copy, Default)]
pub struct TickScheduler;

impl Scheduler for TickScheduler {
    fn schedule(&self, task: Task) {
        with_context(|ctx| ctx.push_task(task));
    }
}

impl fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickScheduler")
            .field("pending", &pending_tasks())
            .finish()
    }
}

// =============================================================================
// DEFER / TICK / FLUSH
// =============================================================================

/// Queue `task` for the next tick on this thread.
pub fn defer(task: impl FnOnce() + 'static) {
    TickScheduler.schedule(Box::new(task));
}

/// Number of tasks waiting for the next tick on this thread.
pub fn pending_tasks() -> usize {
    with_context(|ctx| ctx.pending_tasks())
}

/// Run one tick.
///
/// Only tasks queued before the call run; anything they defer waits for the
/// next tick. Returns the number of tasks that ran.
///
/// If a task panics, the tasks behind it stay queued for the next tick and
/// the panic continues to the caller.
///
/// # Example
///
/// ```
/// use spark_tree::{defer, tick};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let ran = Rc::new(Cell::new(0));
/// let ran_clone = ran.clone();
/// defer(move || ran_clone.set(ran_clone.get() + 1));
///
/// assert_eq!(ran.get(), 0);
/// assert_eq!(tick(), 1);
/// assert_eq!(ran.get(), 1);
/// ```
pub fn tick() -> usize {
    let tasks = with_context(|ctx| {
        ctx.increment_tick_count();
        ctx.take_tasks()
    });

    // Tasks still waiting when one of them panics go back to the queue
    struct TickGuard {
        rest: VecDeque<Task>,
    }

    impl Drop for TickGuard {
        fn drop(&mut self) {
            if !self.rest.is_empty() {
                let rest = std::mem::take(&mut self.rest);
                with_context(|ctx| ctx.requeue_front(rest));
            }
        }
    }

    let mut guard = TickGuard { rest: tasks };
    let mut count = 0;
    while let Some(task) = guard.rest.pop_front() {
        count += 1;
        task();
    }
    count
}

/// Tick until no task is left. Returns the total number of tasks that ran.
///
/// # Panics
///
/// Panics after [`MAX_FLUSH_COUNT`] ticks, which only happens when tasks keep
/// deferring new work forever.
pub fn flush() -> usize {
    let was_flushing = with_context(|ctx| ctx.set_flushing(true));

    // Restore the flag even if a task panics
    struct FlushGuard {
        prev: bool,
    }

    impl Drop for FlushGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.set_flushing(self.prev));
        }
    }

    let _guard = FlushGuard { prev: was_flushing };

    let mut total = 0;
    let mut flush_count = 0u32;
    while pending_tasks() > 0 {
        flush_count += 1;
        if flush_count > MAX_FLUSH_COUNT {
            panic!(
                "Maximum flush depth exceeded. This can happen when a listener \
                 queues a mutation on every update it receives."
            );
        }
        total += tick();
    }
    total
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{is_flushing, tick_count};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn defer_waits_for_tick() {
        let ran = Rc::new(Cell::new(false));
        let ran_clone = ran.clone();
        defer(move || ran_clone.set(true));

        assert!(!ran.get());
        assert_eq!(pending_tasks(), 1);

        assert_eq!(tick(), 1);
        assert!(ran.get());
        assert_eq!(pending_tasks(), 0);
    }

    #[test]
    fn tasks_run_in_deferral_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..4 {
            let order = order.clone();
            defer(move || order.borrow_mut().push(i));
        }
        tick();
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn work_deferred_during_tick_waits_for_next_tick() {
        let ran = Rc::new(Cell::new(0));
        let ran_clone = ran.clone();
        defer(move || {
            ran_clone.set(1);
            let ran_inner = ran_clone.clone();
            defer(move || ran_inner.set(2));
        });

        assert_eq!(tick(), 1);
        assert_eq!(ran.get(), 1);
        assert_eq!(pending_tasks(), 1);

        assert_eq!(tick(), 1);
        assert_eq!(ran.get(), 2);
    }

    #[test]
    fn flush_drains_chained_tasks() {
        let depth = Rc::new(Cell::new(0));

        fn chain(depth: Rc<Cell<u32>>) {
            defer(move || {
                depth.set(depth.get() + 1);
                if depth.get() < 5 {
                    chain(depth);
                }
            });
        }

        chain(depth.clone());
        assert_eq!(flush(), 5);
        assert_eq!(depth.get(), 5);
        assert!(!is_flushing());
    }

    #[test]
    fn panicking_task_keeps_the_rest_queued() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let ran_clone = ran.clone();
        defer(move || ran_clone.borrow_mut().push("first"));
        defer(|| panic!("task failed"));
        let ran_clone = ran.clone();
        defer(move || ran_clone.borrow_mut().push("last"));

        let result = std::panic::catch_unwind(tick);
        assert!(result.is_err());
        assert_eq!(*ran.borrow(), vec!["first"]);
        assert_eq!(pending_tasks(), 1);

        assert_eq!(tick(), 1);
        assert_eq!(*ran.borrow(), vec!["first", "last"]);
    }

    #[test]
    fn tick_counts_even_when_idle() {
        let before = tick_count();
        assert_eq!(tick(), 0);
        assert_eq!(tick_count(), before + 1);
    }

    #[test]
    #[should_panic(expected = "Maximum flush depth exceeded")]
    fn flush_detects_runaway_rescheduling() {
        fn forever() {
            defer(forever);
        }
        forever();
        flush();
    }

    #[test]
    fn max_flush_count_is_reasonable() {
        assert_eq!(MAX_FLUSH_COUNT, 1000);
    }
}
