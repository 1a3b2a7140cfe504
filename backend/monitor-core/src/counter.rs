//! Correlation id generator.
//!
//! Every outbound frame that carries a `cid` draws it from one [`AtomicCounter`]
//! owned by the monitor instance. The value is a plain mutex around an `i64`.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mutex-guarded integer with pre-increment/pre-decrement semantics.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: Mutex<i64>,
}

impl AtomicCounter {
    pub fn new(initial: i64) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    /// Current value without modifying it.
    pub fn value(&self) -> i64 {
        *self.guard()
    }

    /// Overwrite the stored value.
    pub fn set(&self, value: i64) {
        *self.guard() = value;
    }

    /// Increment and return the new value.
    pub fn increment_and_get(&self) -> i64 {
        let mut value = self.guard();
        *value += 1;
        *value
    }

    /// Decrement and return the new value.
    pub fn decrement_and_get(&self) -> i64 {
        let mut value = self.guard();
        *value -= 1;
        *value
    }

    // A panic while holding the guard cannot leave a torn integer behind.
    fn guard(&self) -> MutexGuard<'_, i64> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
