//! Real-time chat server for the Tendril community gardening platform.
//!
//! A long-lived, authenticated WebSocket service: connections present a
//! signed token during the handshake, attach the verified identity for their
//! lifetime, and every accepted message is persisted and fanned out to the
//! other connections in its scope.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// leaf modules
pub mod auth;
