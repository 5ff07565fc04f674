//! Endpoint traits for pipeline stages.
//!
//! A pipeline stage only needs one side of a queue: sources and transforms write
//! to a [`QueueBack`], transforms and sinks read from a [`QueueFront`]. Writing
//! stages against these traits keeps them independent of the concrete queue
//! and of how it is shared (`&BoundedQueue`, `Arc<BoundedQueue>`).
//!
//! The contract between stages is:
//! - the last producer calls [`QueueBack::close`] exactly once;
//! - consumers treat [`PopError::Closed`] as end-of-stream.

use std::sync::Arc;

use crate::error::QueueClosed;
use crate::status::{PopError, PushError};
use crate::sync::bounded::BoundedQueue;

/// Producer side of a queue.
pub trait QueueBack<T> {
    /// Pushes, waiting for space. See [`BoundedQueue::wait_push`].
    ///
    /// # Errors
    ///
    /// [`PushError::Closed`] if the queue is closed.
    fn wait_push(&self, value: T) -> Result<(), PushError<T>>;

    /// Pushes only if there is room now. See [`BoundedQueue::try_push`].
    ///
    /// # Errors
    ///
    /// [`PushError::Full`] or [`PushError::Closed`].
    fn try_push(&self, value: T) -> Result<(), PushError<T>>;

    /// Pushes, waiting for space, with closure reported as [`QueueClosed`].
    ///
    /// # Errors
    ///
    /// [`QueueClosed`] holding the value if the queue is closed.
    fn push(&self, value: T) -> Result<(), QueueClosed<T>> {
        self.wait_push(value)
            .map_err(|err| QueueClosed(err.into_inner()))
    }

    /// Signals end-of-stream to consumers.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Consumer side of a queue.
pub trait QueueFront<T> {
    /// Pops, waiting for data. See [`BoundedQueue::wait_pop`].
    ///
    /// # Errors
    ///
    /// [`PopError::Closed`] at end-of-stream.
    fn wait_pop(&self) -> Result<T, PopError>;

    /// Pops only if data is available now. See [`BoundedQueue::try_pop`].
    ///
    /// # Errors
    ///
    /// [`PopError::Empty`] or [`PopError::Closed`].
    fn try_pop(&self) -> Result<T, PopError>;

    /// Pops, waiting for data, with end-of-stream reported as [`QueueClosed`].
    ///
    /// # Errors
    ///
    /// [`QueueClosed`] at end-of-stream.
    fn value_pop(&self) -> Result<T, QueueClosed> {
        self.wait_pop().map_err(|_| QueueClosed(()))
    }

    fn is_closed(&self) -> bool;

    fn is_empty(&self) -> bool;

    /// Hands every element to `f` until end-of-stream, returning how many there were.
    fn drain_until_closed<F>(&self, mut f: F) -> usize
    where
        Self: Sized,
        F: FnMut(T),
    {
        let mut count = 0;
        while let Ok(value) = self.wait_pop() {
            f(value);
            count += 1;
        }
        count
    }
}

impl<T> QueueBack<T> for BoundedQueue<T> {
    fn wait_push(&self, value: T) -> Result<(), PushError<T>> {
        Self::wait_push(self, value)
    }

    fn try_push(&self, value: T) -> Result<(), PushError<T>> {
        Self::try_push(self, value)
    }

    fn push(&self, value: T) -> Result<(), QueueClosed<T>> {
        Self::push(self, value)
    }

    fn close(&self) {
        Self::close(self);
    }

    fn is_closed(&self) -> bool {
        Self::is_closed(self)
    }
}

impl<T> QueueFront<T> for BoundedQueue<T> {
    fn wait_pop(&self) -> Result<T, PopError> {
        Self::wait_pop(self)
    }

    fn try_pop(&self) -> Result<T, PopError> {
        Self::try_pop(self)
    }

    fn value_pop(&self) -> Result<T, QueueClosed> {
        Self::value_pop(self)
    }

    fn is_closed(&self) -> bool {
        Self::is_closed(self)
    }

    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }
}

impl<T, Q: QueueBack<T> + ?Sized> QueueBack<T> for Arc<Q> {
    fn wait_push(&self, value: T) -> Result<(), PushError<T>> {
        (**self).wait_push(value)
    }

    fn try_push(&self, value: T) -> Result<(), PushError<T>> {
        (**self).try_push(value)
    }

    fn push(&self, value: T) -> Result<(), QueueClosed<T>> {
        (**self).push(value)
    }

    fn close(&self) {
        (**self).close();
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<T, Q: QueueFront<T> + ?Sized> QueueFront<T> for Arc<Q> {
    fn wait_pop(&self) -> Result<T, PopError> {
        (**self).wait_pop()
    }

    fn try_pop(&self) -> Result<T, PopError> {
        (**self).try_pop()
    }

    fn value_pop(&self) -> Result<T, QueueClosed> {
        (**self).value_pop()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    /// Maps every element from `input` into `output`, then closes `output`.
    fn map_stage<A, B>(
        input: &impl QueueFront<A>,
        output: &impl QueueBack<B>,
        f: impl Fn(A) -> B,
    ) -> usize {
        let count = input.drain_until_closed(|value| {
            // Downstream closing early just stops forwarding.
            let _ = output.push(f(value));
        });
        output.close();
        count
    }

    #[test]
    fn test_two_stage_pipeline() {
        let words = Arc::new(BoundedQueue::new(2).unwrap());
        let lengths = Arc::new(BoundedQueue::new(2).unwrap());

        let stage = {
            let words = Arc::clone(&words);
            let lengths = Arc::clone(&lengths);
            thread::spawn(move || map_stage(&words, &lengths, |w: String| w.len()))
        };

        for word in ["queued hello", "queued world", "more stuff"] {
            QueueBack::push(&words, word.to_string()).unwrap();
        }
        QueueBack::close(&words);

        let mut seen = Vec::new();
        let received = lengths.drain_until_closed(|n| seen.push(n));

        assert_eq!(stage.join().unwrap(), 3);
        assert_eq!(received, 3);
        assert_eq!(seen, vec![12, 12, 10]);
        assert!(QueueFront::is_empty(&lengths));
    }

    #[test]
    fn test_trait_object_endpoints() {
        let queue = BoundedQueue::new(1).unwrap();
        let back: &dyn QueueBack<u8> = &queue;
        let front: &dyn QueueFront<u8> = &queue;

        back.try_push(1).unwrap();
        assert!(matches!(back.try_push(2), Err(PushError::Full(2))));
        assert_eq!(front.try_pop(), Ok(1));
        back.close();
        assert!(front.is_closed());
        assert!(front.value_pop().is_err());
    }
}
