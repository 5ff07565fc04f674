//! Operation outcomes.
//!
//! Queue operations report ordinary outcomes (empty, full, closed, contended) as
//! values rather than failures. Push errors hand the rejected value back so the
//! caller keeps ownership of it.

use std::fmt;

use thiserror::Error;

/// Outcome of a single queue operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueStatus {
    /// The value was transferred.
    Success,
    /// Nothing to pop from an open queue.
    Empty,
    /// No room to push into an open queue.
    Full,
    /// The queue is closed (and, for pops, fully drained).
    Closed,
    /// The lock was held by another thread.
    Busy,
    /// A bounded wait expired.
    TimedOut,
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Empty => "empty",
            Self::Full => "full",
            Self::Closed => "closed",
            Self::Busy => "busy",
            Self::TimedOut => "timed out",
        })
    }
}

/// A push that did not happen, carrying the rejected value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushError<T> {
    /// Every slot was occupied.
    Full(T),
    /// The queue was closed.
    Closed(T),
    /// Another thread held the lock.
    Busy(T),
    /// The deadline passed while waiting for space.
    TimedOut(T),
}

impl<T> PushError<T> {
    /// Returns the value that failed to be enqueued.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(v) | Self::Closed(v) | Self::Busy(v) | Self::TimedOut(v) => v,
        }
    }

    /// The status this failure corresponds to.
    #[must_use]
    pub const fn status(&self) -> QueueStatus {
        match self {
            Self::Full(_) => QueueStatus::Full,
            Self::Closed(_) => QueueStatus::Closed,
            Self::Busy(_) => QueueStatus::Busy,
            Self::TimedOut(_) => QueueStatus::TimedOut,
        }
    }

    /// Whether the push failed because the queue is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "push failed: queue {}", self.status())
    }
}

impl<T: fmt::Debug> std::error::Error for PushError<T> {}

/// A pop that produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum PopError {
    /// The queue was open but held no elements.
    #[error("pop failed: queue empty")]
    Empty,
    /// The queue was closed and drained (end of stream).
    #[error("pop failed: queue closed")]
    Closed,
    /// Another thread held the lock.
    #[error("pop failed: queue busy")]
    Busy,
    /// The deadline passed while waiting for data.
    #[error("pop failed: timed out")]
    TimedOut,
}

impl PopError {
    /// The status this failure corresponds to.
    #[must_use]
    pub const fn status(&self) -> QueueStatus {
        match self {
            Self::Empty => QueueStatus::Empty,
            Self::Closed => QueueStatus::Closed,
            Self::Busy => QueueStatus::Busy,
            Self::TimedOut => QueueStatus::TimedOut,
        }
    }
}

/// Collapses an operation result into its [`QueueStatus`].
///
/// Lets callers branch on the status vocabulary directly:
///
/// ```
/// use sluice::{BoundedQueue, Outcome, QueueStatus};
///
/// let queue = BoundedQueue::new(1)?;
/// assert_eq!(queue.try_push(1).status(), QueueStatus::Success);
/// assert_eq!(queue.try_push(2).status(), QueueStatus::Full);
/// # Ok::<(), sluice::ConfigError>(())
/// ```
pub trait Outcome {
    /// [`QueueStatus::Success`] for `Ok`, otherwise the error's status.
    fn status(&self) -> QueueStatus;
}

impl<T> Outcome for Result<(), PushError<T>> {
    fn status(&self) -> QueueStatus {
        match self {
            Ok(()) => QueueStatus::Success,
            Err(err) => err.status(),
        }
    }
}

impl<T> Outcome for Result<T, PopError> {
    fn status(&self) -> QueueStatus {
        match self {
            Ok(_) => QueueStatus::Success,
            Err(err) => err.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_error_returns_value() {
        let err = PushError::Full(String::from("payload"));
        assert_eq!(err.status(), QueueStatus::Full);
        assert!(!err.is_closed());
        assert_eq!(err.into_inner(), "payload");
    }

    #[test]
    fn test_push_error_display() {
        assert_eq!(PushError::Closed(1).to_string(), "push failed: queue closed");
        assert_eq!(PushError::Busy(1).to_string(), "push failed: queue busy");
    }

    #[test]
    fn test_outcome_on_results() {
        let pushed: Result<(), PushError<u8>> = Ok(());
        assert_eq!(pushed.status(), QueueStatus::Success);

        let popped: Result<u8, PopError> = Err(PopError::Closed);
        assert_eq!(popped.status(), QueueStatus::Closed);

        let timed: Result<(), PushError<u8>> = Err(PushError::TimedOut(3));
        assert_eq!(timed.status(), QueueStatus::TimedOut);
    }
}
