use thiserror::Error;

/// Type erased error used where a collaborator's failure is opaque to this crate
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a [`Queue`](crate::Queue) operation
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue name must not be empty")]
    InvalidName,
    #[error("failed to (de)serialize queue item")]
    Serialization(#[source] BoxedError),
    #[error("queue backend failure")]
    Backend(#[source] BoxedError),
}

/// Failure on the transport-facing side
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("the connection id cannot be empty")]
    EmptyConnectionId,
    #[error("the request id cannot be empty")]
    EmptyRequestId,
    #[error("no connection with id {0}")]
    UnknownConnection(String),
    #[error("connection {0} is closed")]
    Closed(String),
    #[error("there are no subscribers to handle the request")]
    NoSubscriber,
    #[error("failed to enqueue inbound request")]
    Enqueue(#[from] QueueError),
    #[error("transport failure")]
    Transport(#[source] BoxedError),
}

/// Failure reported by a [`Processor`](crate::Processor)
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("processing failed")]
    Failed(#[source] BoxedError),
}

/// Construction and lifecycle failures of a coordinator
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    /// A required collaborator was not provided to the builder
    #[error("missing required dependency `{0}`")]
    MissingDependency(&'static str),
    #[error("coordinator is already running")]
    AlreadyRunning,
}

impl CoordinatorError {
    /// Name of the missing parameter, if this is a construction error
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            Self::MissingDependency(name) => Some(name),
            Self::AlreadyRunning => None,
        }
    }
}

/// Unwraps a builder field or names it in the construction error
pub(crate) fn require<T>(value: Option<T>, parameter: &'static str) -> Result<T, CoordinatorError> {
    value.ok_or(CoordinatorError::MissingDependency(parameter))
}
