use thiserror::Error;

/// Failure reported by one of the managed services behind an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("query service error: {0}")]
    QueryService(String),
    #[error("notification service error: {0}")]
    Notification(String),
    #[error("counter store error: {0}")]
    CounterStore(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{name} is invalid: {message}")]
    Invalid { name: &'static str, message: String },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum CounterError {
    #[error(transparent)]
    Store(#[from] BackendError),
    #[error("failed to serialize counter response: {0}")]
    Serialization(#[from] serde_json::Error),
}
