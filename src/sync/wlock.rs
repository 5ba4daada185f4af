//! A mutex + condition-variable pair with signal/broadcast/wait, the
//! building block [`crate::sync::fifo::BoundedFifo`] and [`crate::pool::ThreadPool`]
//! are built from.
//!
//! This is the natural Rust encoding of the `(pthread_mutex_t,
//! pthread_cond_t)` pair the original threadpool's queue guard used --
//! `std::sync::{Mutex, Condvar}` already provide error-checking locking and
//! atomic wait/release, so this is a thin, named wrapper rather than a
//! reimplementation.

use std::sync::{Condvar, Mutex, MutexGuard};

/// Guards `T` behind a mutex and exposes `Condvar` wait/signal/broadcast
/// over the same lock.
pub struct WaitableLock<T> {
    mutex: Mutex<T>,
    condvar: Condvar,
}

impl<T> WaitableLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            mutex: Mutex::new(value),
            condvar: Condvar::new(),
        }
    }

    /// Acquires the lock, blocking the caller until it is available.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.mutex.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Suspends the caller on the condvar, atomically releasing `guard` and
    /// reacquiring it before returning.
    pub fn wait<'a>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.condvar.wait(guard).unwrap_or_else(|e| e.into_inner())
    }

    /// Wakes exactly one waiter.
    pub fn signal(&self) {
        self.condvar.notify_one();
    }

    /// Wakes every waiter.
    pub fn broadcast(&self) {
        self.condvar.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn signal_wakes_single_waiter() {
        let lock = Arc::new(WaitableLock::new(false));
        let waiter = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let mut guard = lock.lock();
                while !*guard {
                    guard = lock.wait(guard);
                }
            })
        };

        thread::sleep(std::time::Duration::from_millis(20));
        *lock.lock() = true;
        lock.signal();
        waiter.join().unwrap();
    }
}
