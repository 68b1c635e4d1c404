//! Locking and counting shared by the shadow table, stats and reports.
//!
//! The lock is `parking_lot`'s mutex with the `parking_lot` feature and a
//! std mutex otherwise. Neither poisons: a strict-mode panic raised while a
//! report is being written must not wedge the next annotation.

use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "parking_lot")]
pub use parking_lot::{Mutex, MutexGuard};

#[cfg(not(feature = "parking_lot"))]
pub use self::std_lock::{Mutex, MutexGuard};

#[cfg(not(feature = "parking_lot"))]
mod std_lock {
    use std::ops::{Deref, DerefMut};
    use std::sync::PoisonError;

    /// `std::sync::Mutex` with poisoning ignored.
    pub struct Mutex<T>(std::sync::Mutex<T>);

    /// Guard returned by [`Mutex::lock`].
    pub struct MutexGuard<'a, T>(std::sync::MutexGuard<'a, T>);

    impl<T> Mutex<T> {
        pub const fn new(value: T) -> Self {
            Self(std::sync::Mutex::new(value))
        }

        pub fn lock(&self) -> MutexGuard<'_, T> {
            MutexGuard(self.0.lock().unwrap_or_else(PoisonError::into_inner))
        }

        pub fn into_inner(self) -> T {
            self.0.into_inner().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl<T: Default> Default for Mutex<T> {
        fn default() -> Self {
            Self::new(T::default())
        }
    }

    impl<T> Deref for MutexGuard<'_, T> {
        type Target = T;

        fn deref(&self) -> &T {
            &self.0
        }
    }

    impl<T> DerefMut for MutexGuard<'_, T> {
        fn deref_mut(&mut self) -> &mut T {
            &mut self.0
        }
    }
}

/// Relaxed event counter. Totals are exact; cross-counter snapshots are not.
#[derive(Default)]
pub struct AtomicCounter(AtomicU64);

impl AtomicCounter {
    pub fn increment(&self) {
        self.add(1);
    }

    pub fn add(&self, value: u64) {
        self.0.fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}
