//! Construction errors and the closed-queue failure.

use std::fmt;

use thiserror::Error;

/// A queue could not be built from the requested configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Capacity must be at least one element.
    #[error("queue capacity must be at least one")]
    ZeroCapacity,
    /// The initial contents did not fit.
    #[error("initial contents exceed queue capacity of {capacity}")]
    TooManyElements { capacity: usize },
}

/// The queue is closed and the operation cannot proceed.
///
/// Returned by the convenience [`push`](crate::BoundedQueue::push) (carrying the
/// rejected value) and [`value_pop`](crate::BoundedQueue::value_pop) operations
/// for callers that prefer `?` over branching on a status.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueClosed<T = ()>(pub T);

impl<T> QueueClosed<T> {
    /// Returns the value that could not be enqueued.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

// Manual impl so the rejected value never has to be `Debug` to report the error.
impl<T> fmt::Debug for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueClosed(..)")
    }
}

impl<T> fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue is closed")
    }
}

impl<T> std::error::Error for QueueClosed<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::ZeroCapacity.to_string(),
            "queue capacity must be at least one"
        );
        assert_eq!(
            ConfigError::TooManyElements { capacity: 2 }.to_string(),
            "initial contents exceed queue capacity of 2"
        );
    }

    #[test]
    fn test_queue_closed_boxes_as_error() {
        fn fails() -> Result<(), Box<dyn std::error::Error>> {
            Err(QueueClosed(vec![1u8, 2]))?
        }
        let err = fails().unwrap_err();
        assert_eq!(err.to_string(), "queue is closed");
    }
}
