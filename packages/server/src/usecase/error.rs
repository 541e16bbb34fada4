//! Error types for the usecase layer.

use thiserror::Error;

use crate::domain::{CodecError, ConnectionId, RepositoryError};

/// Connection registration failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectError {
    #[error("connection {0} is already registered")]
    DuplicateConnectionId(ConnectionId),
}

/// Message sending failures.
///
/// Persistence failures are deliberately absent: a degraded history store
/// must never stop delivery, so they are logged inside the usecase instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendMessageError {
    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] CodecError),
}

/// History retrieval failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
