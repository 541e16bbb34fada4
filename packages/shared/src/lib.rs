//! Shared library for the Tendril chat service.
//!
//! Utilities used by the server binary and its tests: time handling and
//! logging setup.

pub mod logger;
pub mod time;
