//! RUP Protocol - Endpoint
//!
//! High-level API: one socket, one policy, one message at a time.

#[allow(clippy::module_inception)]
mod endpoint;

pub use endpoint::*;
