//! Key-value store error types.

/// Errors raised by a [`KeyValueStore`](super::KeyValueStore) or while
/// waiting on one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No connection to the store could be obtained.
    #[error("Store connection error: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
    },

    /// The store rejected or failed a command.
    #[error("Store command error: {message}")]
    Command {
        /// Description of the command failure.
        message: String,
    },

    /// The caller cancelled the operation.
    #[error("Store operation cancelled")]
    Cancelled,

    /// The operation did not finish before the caller's deadline.
    #[error("Store operation deadline exceeded")]
    DeadlineExceeded,
}

impl StoreError {
    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Command` error.
    #[must_use]
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
        }
    }

    /// Returns `true` if the operation was aborted by the caller's context.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        assert_eq!(
            StoreError::connection("refused").to_string(),
            "Store connection error: refused"
        );
        assert_eq!(
            StoreError::command("WRONGTYPE").to_string(),
            "Store command error: WRONGTYPE"
        );
        assert_eq!(
            StoreError::DeadlineExceeded.to_string(),
            "Store operation deadline exceeded"
        );
    }

    #[test]
    fn test_is_aborted() {
        assert!(StoreError::Cancelled.is_aborted());
        assert!(StoreError::DeadlineExceeded.is_aborted());
        assert!(!StoreError::connection("x").is_aborted());
    }
}
