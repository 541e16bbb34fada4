//! WebSocket wire frames and the message codec.
//!
//! Client → server frames are JSON objects carrying a `message` string
//! (`content` is accepted as an alias); unknown extra fields are ignored for
//! forward compatibility. Server → client frames are
//! `{"type":"text","payload":{content, author:{id, username}, timestamp}}`
//! with an ISO-8601 timestamp.
//!
//! The codec does not limit content size; the connection handler enforces an
//! upper bound before frames reach `decode`.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, CodecError};
use tendril_shared::time::timestamp_to_rfc3339;

/// Message kind discriminator. Only text messages exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
}

/// Author reference inside an outbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorDto {
    pub id: String,
    pub username: String,
}

/// Payload of an outbound text frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPayload {
    pub content: String,
    pub author: AuthorDto,
    /// ISO-8601 string, e.g. `2026-01-01T00:00:00.000Z`
    pub timestamp: String,
}

/// One server → client chat frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub r#type: MessageType,
    pub payload: TextPayload,
}

impl From<&ChatMessage> for OutboundMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            r#type: MessageType::Text,
            payload: TextPayload {
                content: message.content.as_str().to_string(),
                author: AuthorDto {
                    id: message.author.user_id.clone(),
                    username: message.author.username.clone(),
                },
                timestamp: timestamp_to_rfc3339(message.timestamp.value()),
            },
        }
    }
}

/// One client → server chat frame after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub message: String,
}

/// Decode a raw inbound frame.
///
/// Any identity fields the client may have included are ignored here; the
/// connection handler stamps the server-held claim on the message.
pub fn decode(raw_frame: &str) -> Result<InboundFrame, CodecError> {
    let value: serde_json::Value = serde_json::from_str(raw_frame)
        .map_err(|e| CodecError::InvalidFormat(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| CodecError::InvalidFormat("frame is not a JSON object".to_string()))?;

    match object.get("message").or_else(|| object.get("content")) {
        Some(serde_json::Value::String(message)) => Ok(InboundFrame {
            message: message.clone(),
        }),
        Some(_) => Err(CodecError::InvalidFormat(
            "message field is not a string".to_string(),
        )),
        None => Err(CodecError::MissingField("message")),
    }
}

/// Encode an outbound frame to its wire representation.
pub fn encode(message: &OutboundMessage) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(|e| CodecError::InvalidFormat(e.to_string()))
}
