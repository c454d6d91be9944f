//! RUP Protocol - Transport Layer
//!
//! The datagram plumbing under the exchange state machines:
//!
//! - **Port abstraction**: [`DatagramPort`], send-to and receive-from with an
//!   optional timeout
//! - **Async sockets**: [`RupSocket`] wrapper for tokio UDP
//! - **Fault injection**: [`Simulator`] (feature `simulator`) for tests
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │      Endpoint / application             │
//! ├─────────────────────────────────────────┤
//! │   Exchange (sender, receiver)           │
//! ├─────────────────────────────────────────┤
//! │         Transport Layer                 │  ← This module
//! │   port, socket, simulator               │
//! ├─────────────────────────────────────────┤
//! │              UDP                        │
//! └─────────────────────────────────────────┘
//! ```

mod error;
mod port;
#[cfg(feature = "simulator")]
pub mod simulator;
mod socket;

pub use error::*;
pub use port::DatagramPort;
#[cfg(feature = "simulator")]
pub use simulator::{Simulator, SimulatorConfig, SimulatorStats};
pub use socket::*;
