//! Broadcast engine.
//!
//! Encodes a message once and writes the same frame to every `Active` entry
//! in a registry snapshot. Per-recipient failures are collected into the
//! [`DeliveryReport`], never aborting delivery to the remaining recipients.
//! Sends go to each connection's own queue, so delivery order to a single
//! recipient matches the arrival order of validated messages; ordering across
//! recipients is unspecified.

use crate::domain::{CodecError, ConnectionId, DeliveryError};

use super::dto::websocket::{self, OutboundMessage};
use super::registry::{ConnectionSnapshot, ConnectionState};

/// Outcome of one broadcast call.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: Vec<ConnectionId>,
    pub failed: Vec<(ConnectionId, DeliveryError)>,
}

impl DeliveryReport {
    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_fully_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deliver `message` to every eligible entry in `snapshot`.
///
/// `exclude` is the echo policy knob: `Some(id)` skips the originating
/// connection, `None` broadcasts to everyone including the sender.
pub fn broadcast(
    message: &OutboundMessage,
    snapshot: &[ConnectionSnapshot],
    exclude: Option<ConnectionId>,
) -> Result<DeliveryReport, CodecError> {
    let frame = websocket::encode(message)?;

    let mut report = DeliveryReport::default();
    for entry in snapshot {
        if entry.state != ConnectionState::Active {
            continue;
        }
        if Some(entry.id) == exclude {
            continue;
        }
        match entry.sender.send(frame.clone()) {
            Ok(()) => report.delivered.push(entry.id),
            Err(_) => {
                tracing::warn!(
                    "Failed to deliver message to connection {} ('{}'): queue closed",
                    entry.id,
                    entry.username
                );
                report.failed.push((entry.id, DeliveryError::ReceiverClosed));
            }
        }
    }
    Ok(report)
}
