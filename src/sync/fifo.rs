//! Thread-safe fixed-capacity queue with signal-on-add and wait-for-item,
//! grounded on the queue embedded in the original threadpool (`threadpool.c`:
//! `queue_head`/`queue_tail`/`cur_queue_size` over `queue_lock` plus the
//! `queue_not_empty`/`queue_not_full`/`queue_empty` condvar trio).

use std::collections::VecDeque;

use super::wlock::WaitableLock;

struct State<T> {
    items: VecDeque<T>,
    capacity: usize,
    closed: bool,
}

/// A bounded, thread-safe FIFO queue.
pub struct BoundedFifo<T> {
    state: WaitableLock<State<T>>,
}

impl<T> BoundedFifo<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: WaitableLock::new(State {
                items: VecDeque::with_capacity(capacity),
                capacity,
                closed: false,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        let guard = self.state.lock();
        guard.items.len() == guard.capacity
    }

    /// Adds `item` and signals a waiter, iff there is room. Returns `false`
    /// without disturbing state if the queue was full.
    pub fn write_signal(&self, item: T) -> bool {
        let mut guard = self.state.lock();
        if guard.items.len() == guard.capacity {
            return false;
        }
        guard.items.push_back(item);
        drop(guard);
        self.state.signal();
        true
    }

    /// Returns the oldest item, or `None` if the queue is empty.
    pub fn get(&self) -> Option<T> {
        self.state.lock().items.pop_front()
    }

    /// Blocks until an item is available or the queue is woken via
    /// [`BoundedFifo::wake`] with nothing enqueued, in which case `None` is
    /// returned.
    pub fn wait_cond(&self) -> Option<T> {
        let mut guard = self.state.lock();
        while guard.items.is_empty() && !guard.closed {
            guard = self.state.wait(guard);
        }
        guard.items.pop_front()
    }

    /// Wakes every waiter without adding an item, used to release blocked
    /// consumers on shutdown.
    pub fn wake(&self) {
        self.state.lock().closed = true;
        self.state.broadcast();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_fifo_order() {
        let fifo = BoundedFifo::new(4);
        for i in 0..4 {
            assert!(fifo.write_signal(i));
        }
        for i in 0..4 {
            assert_eq!(fifo.get(), Some(i));
        }
        assert_eq!(fifo.get(), None);
    }

    #[test]
    fn add_beyond_capacity_fails_without_disturbing_state() {
        let fifo = BoundedFifo::new(2);
        assert!(fifo.write_signal(1));
        assert!(fifo.write_signal(2));
        assert!(!fifo.write_signal(3));
        assert_eq!(fifo.len(), 2);
        assert_eq!(fifo.get(), Some(1));
        assert_eq!(fifo.get(), Some(2));
    }

    #[test]
    fn wake_releases_waiter_with_none() {
        use std::sync::Arc;
        use std::thread;

        let fifo: Arc<BoundedFifo<i32>> = Arc::new(BoundedFifo::new(2));
        let waiter = {
            let fifo = Arc::clone(&fifo);
            thread::spawn(move || fifo.wait_cond())
        };
        thread::sleep(std::time::Duration::from_millis(20));
        fifo.wake();
        assert_eq!(waiter.join().unwrap(), None);
    }
}
