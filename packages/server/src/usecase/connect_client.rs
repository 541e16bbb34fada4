//! UseCase: register an authenticated connection.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::{
    ChannelScope, ConnectionId, ConnectionIdGenerator, IdentityClaim, RegistryError,
};
use crate::infrastructure::registry::{ConnectionEntry, ConnectionRegistry};

use super::error::ConnectError;

/// Admits a connection to the registry after the handshake has verified its
/// identity. Callers must only invoke this with a claim produced by the
/// token verifier; there is no way to register without one.
pub struct ConnectClientUseCase {
    registry: Arc<ConnectionRegistry>,
    id_generator: ConnectionIdGenerator,
}

impl ConnectClientUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            id_generator: ConnectionIdGenerator::new(),
        }
    }

    /// Register the connection and return its freshly assigned id.
    pub async fn execute(
        &self,
        claim: IdentityClaim,
        scope: Option<ChannelScope>,
        sender: mpsc::UnboundedSender<String>,
    ) -> Result<ConnectionId, ConnectError> {
        let connection_id = self.id_generator.next_id();
        let entry = ConnectionEntry::new(connection_id, claim, scope, sender);
        self.registry
            .add(entry)
            .await
            .map_err(|RegistryError::DuplicateId(id)| ConnectError::DuplicateConnectionId(id))?;
        Ok(connection_id)
    }
}
