/// Why the remote side refused (or never received) a change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    /// HTTP status, or `None` when the request never got a response.
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// Bad caller input. The mutation was never attempted.
    #[error("invalid record {key:?}: {reason}")]
    Validation { key: String, reason: String },

    #[error("no record with key {key:?}")]
    NotFound { key: String },

    /// Another transaction for the same record has not settled yet.
    #[error("a mutation for {key:?} is still in flight")]
    InFlight { key: String },

    #[error("remote rejected the mutation: {0}")]
    Remote(#[from] RemoteError),

    #[error("the transaction was dropped before it settled")]
    Abandoned,
}

impl MutationError {
    pub fn key(&self) -> Option<&str> {
        match self {
            MutationError::Validation { key, .. }
            | MutationError::NotFound { key }
            | MutationError::InFlight { key } => Some(key),
            MutationError::Remote(_) | MutationError::Abandoned => None,
        }
    }
}
