//! Repository trait for message persistence.
//!
//! The domain defines the interface it needs; the infrastructure layer
//! provides the concrete store (dependency inversion). The underlying store
//! is assumed to make a single `save` atomic; no cross-message transactions.

use async_trait::async_trait;

use super::entity::{ChatMessage, StoredMessage};
use super::error::RepositoryError;
use super::value_object::ChannelScope;

/// Persistence gateway for chat history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Durably record a message, assigning a storage id at write time.
    async fn save(
        &self,
        message: ChatMessage,
        scope: Option<ChannelScope>,
    ) -> Result<StoredMessage, RepositoryError>;

    /// Return stored messages in insertion order. `None` returns the full,
    /// unfiltered history; a scope restricts the result to that channel.
    async fn list<'a>(
        &self,
        scope: Option<&'a ChannelScope>,
    ) -> Result<Vec<StoredMessage>, RepositoryError>;
}
