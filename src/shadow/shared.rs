//! Lock-protected shadow table handle.
//!
//! The straddling-granule update is a read-modify-write and is not atomic, so
//! two threads must never annotate the same region at once, and a verifier
//! racing an annotator may see a torn state. `SharedShadow` is the lock a
//! container owns to serialize both.

use std::sync::Arc;

use crate::sync::{Mutex, MutexGuard};

/// Exclusive access to a shared table. Dropping it releases the lock.
pub type ShadowLock<'a, S> = MutexGuard<'a, S>;

/// A cloneable handle to one shadow table behind a mutex.
pub struct SharedShadow<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> SharedShadow<S> {
    /// Wrap a table.
    pub fn new(table: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(table)),
        }
    }

    /// Lock the table.
    pub fn lock(&self) -> ShadowLock<'_, S> {
        self.inner.lock()
    }

    /// Run `f` with the table locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut table = self.inner.lock();
        f(&mut table)
    }

    /// Returns true if both handles point at the same table.
    pub fn same_table(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Recover the table if this is the last handle.
    pub fn try_unwrap(self) -> Result<S, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<S> Clone for SharedShadow<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Default> Default for SharedShadow<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
