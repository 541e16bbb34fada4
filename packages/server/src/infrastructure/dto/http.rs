//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::StoredMessage;
use tendril_shared::time::timestamp_to_rfc3339;

/// One stored message as returned by the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessageDto {
    pub id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub content: String,
    /// ISO-8601 string
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub garden_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl From<StoredMessage> for StoredMessageDto {
    fn from(stored: StoredMessage) -> Self {
        let (garden_id, channel) = match &stored.scope {
            Some(scope) => (
                Some(scope.garden_id().to_string()),
                Some(scope.channel().to_string()),
            ),
            None => (None, None),
        };
        Self {
            id: stored.id.to_string(),
            sender_id: stored.sender_id,
            sender_username: stored.sender_username,
            content: stored.content.into_string(),
            timestamp: timestamp_to_rfc3339(stored.timestamp.value()),
            garden_id,
            channel,
        }
    }
}
