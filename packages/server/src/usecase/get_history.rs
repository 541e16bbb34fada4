//! UseCase: retrieve stored chat history.

use std::sync::Arc;

use crate::domain::{ChannelScope, MessageRepository, StoredMessage};

use super::error::HistoryError;

/// Reads history from the persistence gateway. Read failures surface an
/// explicit error to the caller rather than partial or stale data.
pub struct GetHistoryUseCase {
    repository: Arc<dyn MessageRepository>,
}

impl GetHistoryUseCase {
    pub fn new(repository: Arc<dyn MessageRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(
        &self,
        scope: Option<&ChannelScope>,
    ) -> Result<Vec<StoredMessage>, HistoryError> {
        Ok(self.repository.list(scope).await?)
    }
}
