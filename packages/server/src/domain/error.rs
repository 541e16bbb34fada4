//! Error taxonomy for the chat service.
//!
//! - [`AuthError`] is fatal to a connection attempt and maps to a close code.
//! - [`CodecError`] is non-fatal; the offending frame is dropped.
//! - [`RepositoryError`] is non-fatal to delivery; writes degrade to
//!   broadcast-only, reads surface an explicit failure to the caller.
//! - [`DeliveryError`] is collected per recipient, never raised for the batch.

use thiserror::Error;

use super::value_object::ConnectionId;

/// Value object construction failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message content must not be empty")]
    EmptyContent,

    #[error("channel scope requires a non-empty garden id and channel name")]
    EmptyScopeField,
}

/// Credential verification failures. Each variant maps to a close policy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credential presented")]
    Missing,

    #[error("credential is not a well-formed token")]
    Malformed,

    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,
}

/// Wire frame decode/encode failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("frame is not parseable structured data: {0}")]
    InvalidFormat(String),

    #[error("frame is missing required field '{0}'")]
    MissingField(&'static str),
}

/// Connection registry mutation failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection {0} is already registered")]
    DuplicateId(ConnectionId),
}

/// Persistence gateway failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("failed to write message: {0}")]
    WriteFailed(String),

    #[error("failed to read message history: {0}")]
    ReadFailed(String),
}

/// Per-recipient delivery failure during a broadcast
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("recipient's send queue is closed")]
    ReceiverClosed,
}
