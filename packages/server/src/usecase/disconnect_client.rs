//! UseCase: deregister a connection on close or fatal protocol error.

use std::sync::Arc;

use crate::domain::ConnectionId;
use crate::infrastructure::registry::ConnectionRegistry;

/// Removes a connection from the registry. Idempotent: the connection
/// handler and a server-initiated close may both call this for the same id.
pub struct DisconnectClientUseCase {
    registry: Arc<ConnectionRegistry>,
}

impl DisconnectClientUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self, connection_id: ConnectionId) {
        self.registry.remove(connection_id).await;
    }
}
