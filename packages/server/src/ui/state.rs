//! Shared application state.

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::usecase::{
    ConnectClientUseCase, DisconnectClientUseCase, GetHistoryUseCase, SendMessageUseCase,
};

/// State shared by every handler.
pub struct AppState {
    /// Token verifier for the WebSocket handshake
    pub verifier: TokenVerifier,
    /// UseCase for admitting an authenticated connection
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// UseCase for deregistering a connection
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// UseCase for persisting and broadcasting a message
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// UseCase for reading chat history
    pub get_history_usecase: Arc<GetHistoryUseCase>,
}
