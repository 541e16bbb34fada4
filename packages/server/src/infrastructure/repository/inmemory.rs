//! In-memory message repository.
//!
//! Implements the domain's `MessageRepository` trait over a mutex-guarded
//! `Vec`, preserving insertion order. Suitable for a single-process
//! deployment; a document store slots in behind the same trait.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChannelScope, ChatMessage, MessageRepository, RepositoryError, StoredMessage,
};

/// Process-local store of chat history.
pub struct InMemoryMessageRepository {
    messages: Mutex<Vec<StoredMessage>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn save(
        &self,
        message: ChatMessage,
        scope: Option<ChannelScope>,
    ) -> Result<StoredMessage, RepositoryError> {
        let stored = StoredMessage::from_chat(message, scope);
        let mut messages = self.messages.lock().await;
        messages.push(stored.clone());
        Ok(stored)
    }

    async fn list<'a>(
        &self,
        scope: Option<&'a ChannelScope>,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        let result = match scope {
            None => messages.clone(),
            Some(scope) => messages
                .iter()
                .filter(|m| m.scope.as_ref() == Some(scope))
                .cloned()
                .collect(),
        };
        Ok(result)
    }
}
