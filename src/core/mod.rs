//! RUP Protocol - Core types, constants and policy.
//!
//! This module has no I/O and no runtime dependency. It defines the checksum,
//! the retry policy and the error types shared by every layer.

mod checksum;
mod config;
pub mod constants;
mod error;

pub use checksum::*;
pub use config::*;
pub use error::*;
