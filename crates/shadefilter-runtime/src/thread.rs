//! Pins a value to the thread that created it.
//
// GL contexts are current on exactly one thread. The pipeline must be shareable (configuration
// calls come from anywhere), so device state is wrapped here: it may move between threads inside
// the pipeline's mutex, but it is only ever touched, and only ever dropped, on its owner thread.

use std::fmt;
use std::mem::ManuallyDrop;
use std::thread::{self, ThreadId};

use shadefilter_core::FilterError;

pub struct ThreadBound<T> {
    owner: ThreadId,
    value: ManuallyDrop<T>,
}

// SAFETY: `value` is only reachable through `get_mut`, which checks the owner thread, and `Drop`
// only runs `T`'s destructor on the owner thread. Elsewhere the value is never touched.
unsafe impl<T> Send for ThreadBound<T> {}

impl<T> ThreadBound<T> {
    /// Binds `value` to the current thread.
    pub fn new(value: T) -> Self {
        Self {
            owner: thread::current().id(),
            value: ManuallyDrop::new(value),
        }
    }

    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    pub fn is_owner(&self) -> bool {
        thread::current().id() == self.owner
    }

    pub fn get_mut(&mut self) -> Result<&mut T, FilterError> {
        let caller = thread::current().id();
        if caller != self.owner {
            return Err(FilterError::WrongThread {
                owner: self.owner,
                caller,
            });
        }
        Ok(&mut self.value)
    }
}

impl<T> Drop for ThreadBound<T> {
    fn drop(&mut self) {
        if self.is_owner() {
            // SAFETY: dropped exactly once, here, on the owner thread.
            unsafe { ManuallyDrop::drop(&mut self.value) };
        } else {
            tracing::warn!(
                owner = ?self.owner,
                "gpu state dropped off its render thread; leaking it instead of releasing"
            );
        }
    }
}

impl<T> fmt::Debug for ThreadBound<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The value itself may only be inspected on the owner thread.
        f.debug_struct("ThreadBound")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
