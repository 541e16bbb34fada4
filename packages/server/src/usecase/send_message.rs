//! UseCase: accept one validated inbound message, persist it, and fan it out.
//!
//! Two policies live here:
//!
//! - **Identity override.** The message's author is always the server-held
//!   claim of the sending connection. Identity fields in the client payload
//!   never reach this layer; the codec discards them.
//! - **Durability before visibility.** The message is written to the store
//!   before it is broadcast, so a reader refreshing history never sees a
//!   message that was delivered but not recorded. If the write fails, the
//!   broadcast still proceeds and the failure is logged: chat stays available
//!   when the history store is degraded.

use std::sync::Arc;

use crate::domain::{
    ChannelScope, ChatMessage, ConnectionId, IdentityClaim, MessageContent, MessageRepository,
    Timestamp,
};
use crate::infrastructure::broadcast::{DeliveryReport, broadcast};
use crate::infrastructure::dto::websocket::OutboundMessage;
use crate::infrastructure::registry::ConnectionRegistry;

use super::error::SendMessageError;
use tendril_shared::time::get_utc_timestamp;

pub struct SendMessageUseCase {
    repository: Arc<dyn MessageRepository>,
    registry: Arc<ConnectionRegistry>,
    /// Echo policy: when false, the originating connection is excluded from
    /// its own broadcasts.
    echo_to_sender: bool,
}

impl SendMessageUseCase {
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        registry: Arc<ConnectionRegistry>,
        echo_to_sender: bool,
    ) -> Self {
        Self {
            repository,
            registry,
            echo_to_sender,
        }
    }

    /// Persist and broadcast one message from `sender_id`.
    pub async fn execute(
        &self,
        sender_id: ConnectionId,
        author: &IdentityClaim,
        content: MessageContent,
        scope: Option<&ChannelScope>,
    ) -> Result<DeliveryReport, SendMessageError> {
        let message = ChatMessage {
            author: author.clone(),
            content,
            timestamp: Timestamp::new(get_utc_timestamp()),
        };

        if let Err(e) = self.repository.save(message.clone(), scope.cloned()).await {
            tracing::error!(
                "Failed to persist message from '{}', broadcasting anyway: {}",
                author.username,
                e
            );
        }

        let outbound = OutboundMessage::from(&message);
        let snapshot = self.registry.snapshot(scope).await;
        let exclude = if self.echo_to_sender {
            None
        } else {
            Some(sender_id)
        };
        let report = broadcast(&outbound, &snapshot, exclude)?;
        Ok(report)
    }
}
