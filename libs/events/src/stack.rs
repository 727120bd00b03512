//! Call-scoped stack of in-flight events.
//!
//! Every event that has started and not yet ended sits on the stack of the
//! unit of control driving it. An event raised while a listener handles
//! another event lands above it, so the stack records the nesting.
//!
//! The handle is `!Send`: a stack belongs to one sequential unit of control
//! and can never be mutated concurrently. Use [`NestedEventStack::current`]
//! for the calling thread's stack, or [`NestedEventStack::new`] to thread an
//! explicit stack through a unit of work.

use std::cell::RefCell;
use std::rc::Rc;

use eventflow_id::EventId;
use tracing::{debug, trace};

/// One in-flight event as recorded on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEntry {
    pub id: EventId,
    pub name: &'static str,
}

thread_local! {
    static CURRENT: NestedEventStack = NestedEventStack::new();
}

/// Shared handle to a nested event stack. Clones refer to the same stack.
#[derive(Debug, Clone, Default)]
pub struct NestedEventStack {
    entries: Rc<RefCell<Vec<StackEntry>>>,
}

impl NestedEventStack {
    /// Creates an empty, independent stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stack confined to the calling thread.
    pub fn current() -> Self {
        CURRENT.with(Clone::clone)
    }

    /// Pushes an entry on top.
    ///
    /// An event is on the stack at most once; pushing an ID that is already
    /// present leaves the stack untouched and returns `false`.
    pub fn push(&self, entry: StackEntry) -> bool {
        let mut entries = self.entries.borrow_mut();
        if entries.iter().any(|e| e.id == entry.id) {
            debug!(event = entry.name, event_id = %entry.id, "Event already on stack");
            return false;
        }
        entries.push(entry);
        trace!(event = entry.name, event_id = %entry.id, depth = entries.len(), "Pushed event");
        true
    }

    /// Removes `id` and every entry above it.
    ///
    /// Returns the number of entries removed. An absent ID is not an error:
    /// the scope may already have been unwound.
    pub fn pop_until(&self, id: EventId) -> usize {
        let mut entries = self.entries.borrow_mut();
        let Some(pos) = entries.iter().rposition(|e| e.id == id) else {
            trace!(event_id = %id, "Event not on stack, nothing to pop");
            return 0;
        };
        let removed = entries.len() - pos;
        entries.truncate(pos);
        trace!(event_id = %id, removed, depth = entries.len(), "Popped event");
        removed
    }

    /// Returns the top entry, if any.
    pub fn peek(&self) -> Option<StackEntry> {
        self.entries.borrow().last().copied()
    }

    pub fn depth(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.entries.borrow().iter().any(|e| e.id == id)
    }

    /// Copy of the entries, bottom first.
    pub fn snapshot(&self) -> Vec<StackEntry> {
        self.entries.borrow().clone()
    }

    /// Returns true if both handles refer to the same stack.
    pub fn same_stack(&self, other: &NestedEventStack) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}

/// Removes an event (and everything above it) from its stack when dropped.
///
/// Held across the END publish so the stack is unwound on every exit path,
/// including an error return or a panic unwinding out of a listener.
#[must_use = "the event is released when the guard is dropped"]
pub struct StackRelease {
    stack: NestedEventStack,
    id: EventId,
}

impl StackRelease {
    pub fn new(stack: NestedEventStack, id: EventId) -> Self {
        Self { stack, id }
    }
}

impl Drop for StackRelease {
    fn drop(&mut self) {
        self.stack.pop_until(self.id);
    }
}
