// ============================================================================
// spark-tree - Listener Registry
// Ordered callbacks identified by their Rc
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// An ordered list of callbacks.
///
/// Duplicates are allowed. Removal compares by `Rc` identity, so keep the
/// handle you registered if you want to remove it later.
pub struct ListenerRegistry<F: ?Sized> {
    listeners: RefCell<Vec<Rc<F>>>,
}

impl<F: ?Sized> ListenerRegistry<F> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Append a listener.
    pub fn add(&self, listener: Rc<F>) {
        self.listeners.borrow_mut().push(listener);
    }

    /// Remove the first registration of `listener`, or every listener when
    /// `None`. Returns whether anything was removed.
    pub fn remove(&self, listener: Option<&Rc<F>>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listener {
            Some(target) => match listeners.iter().position(|l| same(l, target)) {
                Some(i) => {
                    listeners.remove(i);
                    true
                }
                None => false,
            },
            None => {
                let had_any = !listeners.is_empty();
                listeners.clear();
                had_any
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// The current listeners, in registration order.
    ///
    /// Callers invoke the snapshot rather than the live list, so a listener
    /// may add or remove listeners while being notified.
    pub fn snapshot(&self) -> Vec<Rc<F>> {
        self.listeners.borrow().clone()
    }
}

impl<F: ?Sized> Default for ListenerRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for ListenerRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

/// Identity of the allocation, ignoring vtables.
fn same<F: ?Sized>(a: &Rc<F>, b: &Rc<F>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

// =============================================================================
// TESTS
// =============================================================================
