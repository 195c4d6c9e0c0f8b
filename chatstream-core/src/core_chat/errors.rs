//! Error types for the chat engine

use crate::core_model::{SendableId, SendableType};
use thiserror::Error;

/// Result type for remote adapter calls
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Failures reported by the remote store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Transport to the store is unavailable
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// The store rejected the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A record could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Target path or record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Adapter error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for AdapterError {
    fn from(e: serde_json::Error) -> Self {
        AdapterError::Decode(e.to_string())
    }
}

/// Errors surfaced by a chat, either to the caller or on the error channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Remote store failure, passed through verbatim
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// A sendable arrived with a kind that has no typed channel
    #[error("Unclassified sendable {id} of kind {kind}")]
    ClassificationGap { id: SendableId, kind: SendableType },

    /// Operation needs an open connection
    #[error("Chat is not connected")]
    NotConnected,

    /// `connect` called while resolving or connected
    #[error("Chat is already connected or connecting")]
    AlreadyConnected,

    /// `disconnect` was called before `connect` finished
    #[error("Connect was cancelled by disconnect")]
    ConnectCancelled,

    /// The chat's background workers have shut down
    #[error("Chat worker stopped")]
    WorkerStopped,
}

impl ChatError {
    /// The adapter failure behind this error, if any
    pub fn adapter_error(&self) -> Option<&AdapterError> {
        match self {
            ChatError::Adapter(e) => Some(e),
            _ => None,
        }
    }
}
