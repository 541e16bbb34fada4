//! Domain layer: value objects, entities, errors, and the repository trait.
//!
//! Everything here is framework-free. The infrastructure layer implements the
//! traits defined here (dependency inversion), and the usecase layer depends
//! only on these types.

mod entity;
mod error;
mod repository;
mod value_object;

pub use entity::{ChatMessage, IdentityClaim, StoredMessage};
pub use error::{
    AuthError, CodecError, DeliveryError, RegistryError, RepositoryError, ValidationError,
};
pub use repository::MessageRepository;
#[cfg(test)]
pub use repository::MockMessageRepository;
pub use value_object::{
    ChannelScope, ConnectionId, ConnectionIdGenerator, MessageContent, Timestamp,
};
