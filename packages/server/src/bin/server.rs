//! Real-time WebSocket chat server for the gardening platform.
//!
//! Clients authenticate during the handshake with a signed token and exchange
//! chat messages that are persisted and broadcast to the other connections.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tendril-server
//! cargo run --bin tendril-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use tendril_server::{
    auth::{TokenVerifier, secret_from_env},
    infrastructure::{registry::ConnectionRegistry, repository::InMemoryMessageRepository},
    ui::{Server, state::AppState},
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, GetHistoryUseCase, SendMessageUseCase,
    },
};
use tendril_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tendril-server")]
#[command(about = "Authenticated WebSocket chat server with broadcast support", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Do not echo a sender's messages back to its own connection
    #[arg(long)]
    no_echo: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Verifier
    // 2. Repository and Registry
    // 3. UseCases
    // 4. AppState
    // 5. Server

    // 1. Token verifier, keyed by the platform-wide signing secret
    let verifier = TokenVerifier::new(&secret_from_env());

    // 2. Message store and connection registry
    let repository = Arc::new(InMemoryMessageRepository::new());
    let registry = Arc::new(ConnectionRegistry::new());

    // 3. Create UseCases
    let connect_client_usecase = Arc::new(ConnectClientUseCase::new(registry.clone()));
    let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(registry.clone()));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        repository.clone(),
        registry.clone(),
        !args.no_echo,
    ));
    let get_history_usecase = Arc::new(GetHistoryUseCase::new(repository.clone()));

    // 4. Shared state for the handlers
    let state = Arc::new(AppState {
        verifier,
        connect_client_usecase,
        disconnect_client_usecase,
        send_message_usecase,
        get_history_usecase,
    });

    // 5. Create and run the server
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
