//! Thread-safe FIFO handing commands from producers to the poll loop

use alloc::collections::VecDeque;
use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Unbounded FIFO protected by a critical section.
///
/// Any context may push; only the poll loop pops. Each operation holds the
/// lock just long enough to touch the deque.
pub struct CommandQueue<T> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<VecDeque<T>>>,
}

impl<T> CommandQueue<T> {
    /// Create an empty queue; usable in a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Append an item at the back.
    pub fn push(&self, item: T) {
        self.inner.lock(|cell| cell.borrow_mut().push_back(item));
    }

    /// Take the item at the front, if any.
    pub fn pop(&self) -> Option<T> {
        self.inner.lock(|cell| cell.borrow_mut().pop_front())
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().is_empty())
    }

    /// Drop every queued item.
    pub fn clear(&self) {
        self.inner.lock(|cell| cell.borrow_mut().clear());
    }
}

impl<T> Default for CommandQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
