//! Domain entities: identity claims and chat messages.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_object::{ChannelScope, MessageContent, Timestamp};

/// Verified identity attached to a connection.
///
/// Decoded from a signed token during the handshake and immutable afterwards.
/// The connection entry holds the only copy; no session table is consulted
/// per message. Client payloads are never allowed to override these fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    /// Unique user identifier (the token's `sub`)
    pub user_id: String,
    /// Display name shown to other participants
    pub username: String,
    /// Optional profile attribute carried by the token
    pub avatar_color: Option<String>,
}

/// One validated unit of chat content, immutable after creation.
///
/// The author is always the server-held [`IdentityClaim`] of the connection
/// that sent the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub author: IdentityClaim,
    pub content: MessageContent,
    pub timestamp: Timestamp,
}

/// A durably recorded message, as returned by the persistence gateway.
///
/// Acquires its id at write time. Content is a [`MessageContent`], so a
/// stored message can never carry empty text, and the sender fields come from
/// a verified claim, so they are never blank either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: Uuid,
    pub sender_id: String,
    pub sender_username: String,
    pub content: MessageContent,
    pub timestamp: Timestamp,
    pub scope: Option<ChannelScope>,
}

impl StoredMessage {
    /// Build a stored record from a validated message, assigning a fresh id.
    pub fn from_chat(message: ChatMessage, scope: Option<ChannelScope>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id: message.author.user_id,
            sender_username: message.author.username,
            content: message.content,
            timestamp: message.timestamp,
            scope,
        }
    }
}
