//! UseCase layer: the operations the UI layer invokes.
//!
//! Each usecase receives its collaborators (registry, repository) through
//! constructor injection and exposes a single `execute` entry point.

mod connect_client;
mod disconnect_client;
mod error;
mod get_history;
mod send_message;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use error::{ConnectError, HistoryError, SendMessageError};
pub use get_history::GetHistoryUseCase;
pub use send_message::SendMessageUseCase;
