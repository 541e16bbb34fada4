//! Concrete message repository implementations.
//!
//! - `inmemory`: process-local store, used by default and in tests.
//! - A document-store implementation can be added behind the same trait.

pub mod inmemory;

pub use inmemory::InMemoryMessageRepository;
