//! Data Transfer Objects (DTOs) for the chat service.
//!
//! DTOs are organized by protocol:
//! - `websocket`: wire frames and the message codec
//! - `http`: HTTP API response DTOs

pub mod http;
pub mod websocket;
