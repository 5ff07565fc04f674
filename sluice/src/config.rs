//! Construction-time queue configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for building a [`BoundedQueue`](crate::BoundedQueue).
///
/// Validation is eager: it runs when a queue is built from the config, so an
/// invalid config never produces a queue.
///
/// ```
/// use sluice::{BoundedQueue, QueueConfig};
///
/// let config = QueueConfig {
///     capacity: 64,
///     label: Some("parsed-records".into()),
/// };
/// let queue = BoundedQueue::<String>::with_config(config)?;
/// assert_eq!(queue.name(), Some("parsed-records"));
/// # Ok::<(), sluice::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of buffered elements. Must be at least one.
    pub capacity: usize,
    /// Diagnostic name; has no effect on queue behaviour.
    pub label: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            label: None,
        }
    }
}

impl QueueConfig {
    /// Unlabelled config with the given capacity.
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            label: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// # Errors
    ///
    /// [`ConfigError::ZeroCapacity`] if `capacity` is zero.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = QueueConfig::default();
        assert_eq!(config.capacity, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            QueueConfig::with_capacity(0).validate(),
            Err(ConfigError::ZeroCapacity)
        );
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: QueueConfig = serde_json::from_str(r#"{ "label": "ingest" }"#).unwrap();
        assert_eq!(config.capacity, 1024);
        assert_eq!(config.label.as_deref(), Some("ingest"));

        let config: QueueConfig = serde_json::from_str(r#"{ "capacity": 8 }"#).unwrap();
        assert_eq!(config, QueueConfig::with_capacity(8));
    }
}
