//! Bounded, closeable, thread-safe FIFO queue.
//!
//! [`BoundedQueue`] is the building block for producer/consumer pipelines: any
//! number of threads may push and pop concurrently, and a producer signals
//! end-of-stream by calling [`close`](BoundedQueue::close). Closing stops new
//! pushes but never discards buffered elements; consumers keep draining until
//! the buffer is empty and only then observe [`PopError::Closed`].
//!
//! # Operation families
//!
//! | family | waits for the lock | waits for space/data |
//! |---|---|---|
//! | `wait_*`, [`push`](BoundedQueue::push), [`value_pop`](BoundedQueue::value_pop) | yes | yes, until it appears or the queue closes |
//! | `wait_*_timeout` | yes | yes, until a deadline |
//! | `try_*` | yes | no, reports `Full` / `Empty` |
//! | `nonblocking_*` | no, reports `Busy` | no |
//!
//! # Example
//!
//! ```
//! use std::thread;
//! use sluice::{BoundedQueue, PopError};
//!
//! let queue = BoundedQueue::new(4)?;
//!
//! thread::scope(|s| {
//!     s.spawn(|| {
//!         for i in 0..10 {
//!             queue.push(i).unwrap();
//!         }
//!         queue.close();
//!     });
//!
//!     let mut received = Vec::new();
//!     loop {
//!         match queue.wait_pop() {
//!             Ok(v) => received.push(v),
//!             Err(PopError::Closed) => break,
//!             Err(other) => panic!("unexpected {other}"),
//!         }
//!     }
//!     assert_eq!(received, (0..10).collect::<Vec<_>>());
//! });
//! # Ok::<(), sluice::ConfigError>(())
//! ```
//!
//! # Failure
//!
//! A panic while the queue lock is held closes the queue permanently and keeps
//! unwinding in the panicking thread. Every other thread then sees a closed
//! queue instead of half-updated state.

use std::fmt;
use std::time::Duration;

use minstant::Instant;

use super::monitor::{Monitor, State};
use crate::config::QueueConfig;
use crate::error::{ConfigError, QueueClosed};
use crate::ring::Ring;
use crate::status::{PopError, PushError};
use crate::trace::{debug, trace};

/// How long a blocking operation may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Wait indefinitely.
    Infinite,
    /// Wait for at most the specified duration.
    Duration(Duration),
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

impl Timeout {
    /// Absolute deadline, or `None` for an unbounded wait.
    fn deadline(self) -> Option<Instant> {
        match self {
            Self::Infinite => None,
            // A deadline past the end of the clock is as good as none.
            Self::Duration(d) => Instant::now().checked_add(d),
        }
    }
}

/// Bounded multi-producer multi-consumer FIFO queue with an explicit closed state.
///
/// Share it between threads by reference (e.g. [`std::thread::scope`]) or in an
/// [`Arc`](std::sync::Arc). All operations take `&self`.
pub struct BoundedQueue<T> {
    monitor: Monitor<T>,
    capacity: usize,
    label: Option<String>,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue holding at most `capacity` elements.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(QueueConfig::with_capacity(capacity))
    }

    /// Creates an empty queue with a diagnostic name.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroCapacity`] if `capacity` is zero.
    pub fn with_label(capacity: usize, label: impl Into<String>) -> Result<Self, ConfigError> {
        Self::with_config(QueueConfig::with_capacity(capacity).label(label))
    }

    /// Creates an empty queue from a [`QueueConfig`].
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroCapacity`] if `config.capacity` is zero.
    pub fn with_config(config: QueueConfig) -> Result<Self, ConfigError> {
        Self::from_config_iter(config, std::iter::empty())
    }

    /// Creates a queue pre-loaded with `items`, in iteration order.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroCapacity`] if `capacity` is zero, or
    /// [`ConfigError::TooManyElements`] if `items` yields more than `capacity`
    /// elements. At most `capacity + 1` elements are pulled from the iterator.
    pub fn from_iter_with_capacity<I>(capacity: usize, items: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_config_iter(QueueConfig::with_capacity(capacity), items)
    }

    /// Like [`from_iter_with_capacity`](Self::from_iter_with_capacity), with a
    /// diagnostic name.
    ///
    /// # Errors
    ///
    /// See [`from_iter_with_capacity`](Self::from_iter_with_capacity).
    pub fn from_iter_labeled<I>(
        capacity: usize,
        items: I,
        label: impl Into<String>,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_config_iter(QueueConfig::with_capacity(capacity).label(label), items)
    }

    /// Creates a queue from a [`QueueConfig`], pre-loaded with `items`.
    ///
    /// The initial load is all-or-nothing: on overflow no queue is created and
    /// the elements already taken from `items` are dropped.
    ///
    /// # Errors
    ///
    /// See [`from_iter_with_capacity`](Self::from_iter_with_capacity).
    pub fn from_config_iter<I>(config: QueueConfig, items: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
    {
        config.validate()?;
        let QueueConfig { capacity, label } = config;

        let mut ring = Ring::with_capacity(capacity);
        for item in items {
            ring.push_back(item)
                .map_err(|_| ConfigError::TooManyElements { capacity })?;
        }

        debug!(capacity, label = ?label, preloaded = ring.len(), "queue created");

        Ok(Self {
            monitor: Monitor::new(ring),
            capacity,
            label,
        })
    }

    /// Maximum number of buffered elements.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Diagnostic name given at construction.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether [`close`](Self::close) has been called (or a failure closed the queue).
    ///
    /// This is a snapshot; other threads may change it right after it is taken.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.monitor.lock().closed
    }

    /// Whether the buffer currently holds no elements. A snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.monitor.lock().ring.is_empty()
    }

    /// Whether every slot is currently occupied. A snapshot.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.monitor.lock().ring.is_full()
    }

    /// Number of buffered elements. A snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.monitor.lock().ring.len()
    }

    /// Closes the queue and wakes every blocked producer and consumer.
    ///
    /// Subsequent pushes fail with `Closed`. Buffered elements stay poppable.
    /// Calling `close` again has no further effect.
    pub fn close(&self) {
        let mut state = self.monitor.lock();
        if self.monitor.close(&mut state) {
            debug!(label = ?self.label, buffered = state.ring.len(), "queue closed");
        }
    }

    /// Pushes `value`, waiting for space if the queue is full.
    ///
    /// # Errors
    ///
    /// [`PushError::Closed`] with the value if the queue is or becomes closed
    /// before space appears.
    pub fn wait_push(&self, value: T) -> Result<(), PushError<T>> {
        self.push_until(value, None)
    }

    /// Like [`wait_push`](Self::wait_push), giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// [`PushError::Closed`] if the queue closes first, [`PushError::TimedOut`]
    /// if the deadline passes with the queue still full.
    pub fn wait_push_timeout(
        &self,
        value: T,
        timeout: impl Into<Timeout>,
    ) -> Result<(), PushError<T>> {
        self.push_until(value, Timeout::deadline(timeout.into()))
    }

    /// Pushes `value`, waiting for space; a closed queue is reported as an error
    /// suited to `?`.
    ///
    /// # Errors
    ///
    /// [`QueueClosed`] holding the value if the queue is closed.
    pub fn push(&self, value: T) -> Result<(), QueueClosed<T>> {
        self.wait_push(value)
            .map_err(|err| QueueClosed(err.into_inner()))
    }

    /// Pushes `value` if there is room right now. May wait for the lock.
    ///
    /// # Errors
    ///
    /// [`PushError::Closed`] or [`PushError::Full`], returning the value.
    pub fn try_push(&self, value: T) -> Result<(), PushError<T>> {
        let _unwind = self.monitor.close_on_unwind();
        let mut state = self.monitor.lock();
        self.offer(&mut state, value)
    }

    /// Pushes `value` only if neither the lock nor a slot requires waiting.
    ///
    /// # Errors
    ///
    /// [`PushError::Busy`] if another thread holds the lock, otherwise as
    /// [`try_push`](Self::try_push).
    pub fn nonblocking_push(&self, value: T) -> Result<(), PushError<T>> {
        let _unwind = self.monitor.close_on_unwind();
        let Some(mut state) = self.monitor.try_lock() else {
            return Err(PushError::Busy(value));
        };
        self.offer(&mut state, value)
    }

    /// Pops the front element, waiting for data while the queue is open.
    ///
    /// # Errors
    ///
    /// [`PopError::Closed`] once the queue is closed and drained.
    pub fn wait_pop(&self) -> Result<T, PopError> {
        self.pop_until(None)
    }

    /// Like [`wait_pop`](Self::wait_pop), giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// [`PopError::Closed`] once closed and drained, [`PopError::TimedOut`] if
    /// the deadline passes with the queue still open and empty.
    pub fn wait_pop_timeout(&self, timeout: impl Into<Timeout>) -> Result<T, PopError> {
        self.pop_until(Timeout::deadline(timeout.into()))
    }

    /// Pops the front element, waiting for data; end-of-stream is reported as an
    /// error suited to `?`.
    ///
    /// # Errors
    ///
    /// [`QueueClosed`] once the queue is closed and drained.
    pub fn value_pop(&self) -> Result<T, QueueClosed> {
        self.wait_pop().map_err(|_| QueueClosed(()))
    }

    /// Pops the front element if there is one right now. May wait for the lock.
    ///
    /// # Errors
    ///
    /// [`PopError::Empty`] on an open empty queue, [`PopError::Closed`] on a
    /// closed drained one.
    pub fn try_pop(&self) -> Result<T, PopError> {
        let _unwind = self.monitor.close_on_unwind();
        let mut state = self.monitor.lock();
        self.take(&mut state)
    }

    /// Pops only if neither the lock nor data requires waiting.
    ///
    /// # Errors
    ///
    /// [`PopError::Busy`] if another thread holds the lock, otherwise as
    /// [`try_pop`](Self::try_pop).
    pub fn nonblocking_pop(&self) -> Result<T, PopError> {
        let _unwind = self.monitor.close_on_unwind();
        let Some(mut state) = self.monitor.try_lock() else {
            return Err(PopError::Busy);
        };
        self.take(&mut state)
    }

    /// Removes every buffered element in FIFO order, open or closed.
    pub fn drain(&self) -> Vec<T> {
        let _unwind = self.monitor.close_on_unwind();
        let mut state = self.monitor.lock();
        self.monitor.drain(&mut state)
    }

    fn offer(&self, state: &mut State<T>, value: T) -> Result<(), PushError<T>> {
        if state.closed {
            return Err(PushError::Closed(value));
        }
        self.monitor.push_at(state, value).map_err(PushError::Full)
    }

    fn take(&self, state: &mut State<T>) -> Result<T, PopError> {
        match self.monitor.pop_from(state) {
            Some(value) => Ok(value),
            None if state.closed => Err(PopError::Closed),
            None => Err(PopError::Empty),
        }
    }

    fn push_until(&self, mut value: T, deadline: Option<Instant>) -> Result<(), PushError<T>> {
        let _unwind = self.monitor.close_on_unwind();
        let mut state = self.monitor.lock();
        loop {
            if state.closed {
                return Err(PushError::Closed(value));
            }
            match self.monitor.push_at(&mut state, value) {
                Ok(()) => return Ok(()),
                Err(returned) => value = returned,
            }
            let timeout = match deadline {
                None => None,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        trace!(label = ?self.label, "push wait expired");
                        return Err(PushError::TimedOut(value));
                    }
                    Some(deadline.duration_since(now))
                }
            };
            state = self.monitor.wait_for_space(state, timeout);
        }
    }

    fn pop_until(&self, deadline: Option<Instant>) -> Result<T, PopError> {
        let _unwind = self.monitor.close_on_unwind();
        let mut state = self.monitor.lock();
        loop {
            if let Some(value) = self.monitor.pop_from(&mut state) {
                return Ok(value);
            }
            if state.closed {
                return Err(PopError::Closed);
            }
            let timeout = match deadline {
                None => None,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        trace!(label = ?self.label, "pop wait expired");
                        return Err(PopError::TimedOut);
                    }
                    Some(deadline.duration_since(now))
                }
            };
            state = self.monitor.wait_for_data(state, timeout);
        }
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("label", &self.label)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
