//! Infrastructure layer: connection registry, broadcast engine, wire DTOs,
//! and the concrete message repository.

pub mod broadcast;
pub mod dto;
pub mod registry;
pub mod repository;
