//! Bounded FIFO queue between one producer and one consumer.
//!
//! Both ends block with a deadline: [`QueueProducer::offer`] waits for room,
//! [`QueueConsumer::poll`] waits for an item. Dropping either handle
//! disconnects the queue, which wakes the other side immediately.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Items are not preallocated beyond this, even for very large capacities
const PREALLOC_LIMIT: usize = 4096;

/// Why an offer did not go through. The rejected item is handed back.
#[derive(Debug, PartialEq, Eq)]
pub enum OfferError<T> {
    /// The queue stayed full for the whole timeout
    Timeout(T),
    /// The consumer handle was dropped
    Closed(T),
}

impl<T> OfferError<T> {
    /// Take back the item that was not enqueued
    pub fn into_inner(self) -> T {
        match self {
            OfferError::Timeout(item) | OfferError::Closed(item) => item,
        }
    }
}

/// Why a poll returned without an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollError {
    /// The queue stayed empty for the whole timeout
    Timeout,
    /// The queue is empty and the producer handle was dropped
    Disconnected,
}

struct State<T> {
    items: VecDeque<T>,
    producer_alive: bool,
    consumer_alive: bool,
}

struct Shared<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

/// Block on `condvar` until notified or `deadline` passes, returning true on
/// timeout. A deadline past what `Instant` can represent means no deadline.
fn wait<T>(
    condvar: &Condvar,
    state: &mut MutexGuard<'_, State<T>>,
    deadline: Option<Instant>,
) -> bool {
    match deadline {
        Some(deadline) => condvar.wait_until(state, deadline).timed_out(),
        None => {
            condvar.wait(state);
            false
        }
    }
}

/// Create a queue holding at most `capacity` items.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn bounded<T>(capacity: usize) -> (QueueProducer<T>, QueueConsumer<T>) {
    assert!(capacity > 0, "queue capacity must be greater than 0");

    let shared = Arc::new(Shared {
        capacity,
        state: Mutex::new(State {
            items: VecDeque::with_capacity(capacity.min(PREALLOC_LIMIT)),
            producer_alive: true,
            consumer_alive: true,
        }),
        not_empty: Condvar::new(),
        not_full: Condvar::new(),
    });

    (
        QueueProducer {
            shared: Arc::clone(&shared),
        },
        QueueConsumer { shared },
    )
}

/// Sending half of a [`bounded`] queue
pub struct QueueProducer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> QueueProducer<T> {
    /// Enqueue `item`, waiting up to `timeout` for room
    pub fn offer(&self, item: T, timeout: Duration) -> Result<(), OfferError<T>> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.shared.state.lock();

        loop {
            if !state.consumer_alive {
                return Err(OfferError::Closed(item));
            }
            if state.items.len() < self.shared.capacity {
                state.items.push_back(item);
                drop(state);
                self.shared.not_empty.notify_one();
                return Ok(());
            }
            if wait(&self.shared.not_full, &mut state, deadline) {
                // Room may have appeared right at the deadline
                if state.consumer_alive && state.items.len() < self.shared.capacity {
                    continue;
                }
                return Err(OfferError::Timeout(item));
            }
        }
    }

    /// Drop every buffered item, returning how many were removed
    pub fn clear(&self) -> usize {
        let mut state = self.shared.state.lock();
        let removed = state.items.len();
        state.items.clear();
        drop(state);
        self.shared.not_full.notify_all();
        removed
    }

    /// True once the consumer handle has been dropped
    pub fn is_closed(&self) -> bool {
        !self.shared.state.lock().consumer_alive
    }

    /// Maximum number of buffered items
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

impl<T> Drop for QueueProducer<T> {
    fn drop(&mut self) {
        self.shared.state.lock().producer_alive = false;
        self.shared.not_empty.notify_all();
    }
}

/// Receiving half of a [`bounded`] queue
pub struct QueueConsumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> QueueConsumer<T> {
    /// Dequeue the oldest item, waiting up to `timeout` for one to arrive.
    ///
    /// Items enqueued before the producer was dropped are still returned;
    /// `Disconnected` is only reported once the queue is empty.
    pub fn poll(&self, timeout: Duration) -> Result<T, PollError> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.shared.state.lock();

        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.shared.not_full.notify_one();
                return Ok(item);
            }
            if !state.producer_alive {
                return Err(PollError::Disconnected);
            }
            if wait(&self.shared.not_empty, &mut state, deadline) && state.items.is_empty()
            {
                return Err(if state.producer_alive {
                    PollError::Timeout
                } else {
                    PollError::Disconnected
                });
            }
        }
    }

    /// Number of buffered items
    pub fn len(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for QueueConsumer<T> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.consumer_alive = false;
        // Nobody will read these any more
        state.items.clear();
        drop(state);
        self.shared.not_full.notify_all();
    }
}
