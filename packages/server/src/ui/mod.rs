//! UI layer: the axum server, shared state, and protocol handlers.

pub mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
