//! Protocol handlers for the chat service.
//!
//! - `websocket`: the real-time connection endpoint
//! - `http`: health check and history retrieval

pub mod http;
pub mod websocket;
