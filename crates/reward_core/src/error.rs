use thiserror::Error;

/// Failures reported by the persistence collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Write conflict for {key}")]
    Conflict { key: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Failures reported while handing a job to the notification queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Notification queue is full")]
    QueueFull,

    #[error("Notification queue is closed")]
    QueueClosed,

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors surfaced to the caller of a submission.
#[derive(Error, Debug)]
pub enum RewardError {
    #[error("Invalid submission: {0}")]
    Validation(String),

    #[error("Persistence failure: {0}")]
    Store(#[from] StoreError),
}

impl RewardError {
    /// Whether the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            RewardError::Validation(_) => false,
            RewardError::Store(StoreError::Unavailable(_)) => true,
            RewardError::Store(StoreError::Conflict { .. }) => true,
            RewardError::Store(StoreError::NotFound(_)) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RewardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(RewardError::from(StoreError::Unavailable("down".into())).is_retryable());
        assert!(RewardError::from(StoreError::Conflict { key: "u1".into() }).is_retryable());
        assert!(!RewardError::from(StoreError::NotFound("u1".into())).is_retryable());
        assert!(!RewardError::Validation("aim".into()).is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = RewardError::from(StoreError::Unavailable("timeout".into()));
        assert_eq!(err.to_string(), "Persistence failure: Store unavailable: timeout");
    }
}
