//! Mutex, condition variables and waiter bookkeeping around a [`Ring`].
//!
//! # Wakeup protocol
//!
//! A thread that must wait bumps the matching waiter count and parks on its
//! condition variable. The thread that makes progress possible (a pop for
//! producers, a push for consumers) decrements the count, records a pending
//! wakeup and wakes exactly one waiter. Woken threads always re-check their
//! condition in a loop, so a spurious wakeup or a competitor stealing the slot
//! only costs another wait. Closing broadcasts on both condition variables,
//! since it changes the outcome for every waiter.
//!
//! Every thread leaving the condition variable settles its own entry: it takes
//! a pending wakeup if there is one, otherwise nobody removed it from the count
//! (timeout, spurious wakeup, close) and it decrements the count itself. The
//! counts only cover threads that have parked and not yet re-checked.
//!
//! # Fail-stop
//!
//! A panic inside a critical section poisons the mutex. Whoever next acquires it
//! recovers the state, marks the queue closed and wakes everybody. The panicking
//! thread's [`CloseOnUnwind`] guard does the same eagerly, so parked threads do
//! not sleep through the failure.

use std::sync::{Condvar, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::Duration;

use crate::ring::Ring;
use crate::trace::error;

/// Everything guarded by the queue lock.
pub(super) struct State<T> {
    pub(super) ring: Ring<T>,
    pub(super) closed: bool,
    /// Producers parked on `not_full`.
    pub(super) waiting_full: usize,
    /// Consumers parked on `not_empty`.
    pub(super) waiting_empty: usize,
    /// Wakeups sent on `not_full` that no producer has picked up yet.
    notified_full: usize,
    /// Wakeups sent on `not_empty` that no consumer has picked up yet.
    notified_empty: usize,
}

/// Accounts for one thread returning from a condition variable wait.
fn settle(waiting: &mut usize, notified: &mut usize) {
    if *notified > 0 {
        *notified -= 1;
    } else {
        *waiting = waiting.saturating_sub(1);
    }
}

pub(super) type Guard<'a, T> = MutexGuard<'a, State<T>>;

pub(super) struct Monitor<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> Monitor<T> {
    pub(super) fn new(ring: Ring<T>) -> Self {
        Self {
            state: Mutex::new(State {
                ring,
                closed: false,
                waiting_full: 0,
                waiting_empty: 0,
                notified_full: 0,
                notified_empty: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Blocks until the lock is acquired.
    pub(super) fn lock(&self) -> Guard<'_, T> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| self.fail_stop(poisoned.into_inner()))
    }

    /// Acquires the lock only if it is free right now.
    ///
    /// Returns `None` when another thread holds it.
    pub(super) fn try_lock(&self) -> Option<Guard<'_, T>> {
        match self.state.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(poisoned)) => Some(self.fail_stop(poisoned.into_inner())),
        }
    }

    /// Arms a guard that closes the queue if the current thread unwinds.
    ///
    /// Must be created *before* the lock is taken so that it drops after the
    /// lock guard; it re-acquires the lock itself.
    pub(super) fn close_on_unwind(&self) -> CloseOnUnwind<'_, T> {
        CloseOnUnwind {
            monitor: self,
            panicking: thread::panicking(),
        }
    }

    /// Parks the caller until a push (or close) wakes it.
    pub(super) fn wait_for_data<'a>(
        &'a self,
        mut guard: Guard<'a, T>,
        timeout: Option<Duration>,
    ) -> Guard<'a, T> {
        guard.waiting_empty += 1;
        let mut guard = self.park(&self.not_empty, guard, timeout);
        let state = &mut *guard;
        settle(&mut state.waiting_empty, &mut state.notified_empty);
        guard
    }

    /// Parks the caller until a pop (or close) wakes it.
    pub(super) fn wait_for_space<'a>(
        &'a self,
        mut guard: Guard<'a, T>,
        timeout: Option<Duration>,
    ) -> Guard<'a, T> {
        guard.waiting_full += 1;
        let mut guard = self.park(&self.not_full, guard, timeout);
        let state = &mut *guard;
        settle(&mut state.waiting_full, &mut state.notified_full);
        guard
    }

    fn park<'a>(
        &'a self,
        condvar: &Condvar,
        guard: Guard<'a, T>,
        timeout: Option<Duration>,
    ) -> Guard<'a, T> {
        match timeout {
            None => condvar
                .wait(guard)
                .unwrap_or_else(|poisoned| self.fail_stop(poisoned.into_inner())),
            // The caller re-checks its own deadline, the timeout flag adds nothing.
            Some(timeout) => match condvar.wait_timeout(guard, timeout) {
                Ok((guard, _)) => guard,
                Err(poisoned) => self.fail_stop(poisoned.into_inner().0),
            },
        }
    }

    /// Takes the front element and hands the freed slot to one parked producer.
    pub(super) fn pop_from(&self, state: &mut State<T>) -> Option<T> {
        let value = state.ring.pop_front()?;
        if state.waiting_full > 0 {
            state.waiting_full -= 1;
            state.notified_full += 1;
            self.not_full.notify_one();
        }
        Some(value)
    }

    /// Stores `value` at the back and wakes one parked consumer.
    ///
    /// # Errors
    ///
    /// Returns `Err(value)` if the ring is full; nothing is modified.
    pub(super) fn push_at(&self, state: &mut State<T>, value: T) -> Result<(), T> {
        state.ring.push_back(value)?;
        if state.waiting_empty > 0 {
            state.waiting_empty -= 1;
            state.notified_empty += 1;
            self.not_empty.notify_one();
        }
        Ok(())
    }

    /// Removes every buffered element, waking one parked producer per freed slot.
    pub(super) fn drain(&self, state: &mut State<T>) -> Vec<T> {
        let drained = state.ring.drain();
        let wake = state.waiting_full.min(drained.len());
        state.waiting_full -= wake;
        state.notified_full += wake;
        for _ in 0..wake {
            self.not_full.notify_one();
        }
        drained
    }

    /// Marks the queue closed and wakes every waiter.
    ///
    /// Returns `true` if this call performed the transition.
    pub(super) fn close(&self, state: &mut State<T>) -> bool {
        let was_open = !state.closed;
        state.closed = true;
        self.broadcast();
        was_open
    }

    fn broadcast(&self) {
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    fn fail_stop<'a>(&self, mut guard: Guard<'a, T>) -> Guard<'a, T> {
        if !guard.closed {
            error!("queue lock poisoned by a panicking thread, closing queue");
            self.close(&mut guard);
        }
        guard
    }
}

/// Closes the queue when dropped during a panic that started after it was armed.
pub(super) struct CloseOnUnwind<'a, T> {
    monitor: &'a Monitor<T>,
    panicking: bool,
}

impl<T> Drop for CloseOnUnwind<'_, T> {
    fn drop(&mut self) {
        if !self.panicking && thread::panicking() {
            let mut state = self.monitor.lock();
            if self.monitor.close(&mut state) {
                error!("panic during queue operation, queue closed");
            }
        }
    }
}
