//! # RUP Protocol
//!
//! **R**eliable **U**DP **P**rotocol
//!
//! RUP delivers one application message at a time, exactly once, over
//! unreliable UDP datagrams. Each message is moved by a stop-and-wait
//! handshake:
//!
//! - **Data**: the frame is retransmitted until the receiver acknowledges it
//! - **Delivery ack**: the sender confirms it saw the acknowledgment
//! - **Stop ack**: a short FINAL_ACK exchange lets both sides stop
//!
//! Frames are fixed 1100-byte datagrams with a payload checksum; corrupt,
//! malformed and foreign datagrams are never delivered.
//!
//! ## Feature Flags
//!
//! - `transport` (default): tokio socket, exchange state machines, endpoint
//! - `simulator` (default): fault-injecting port for tests
//!
//! ## Modules
//!
//! - [`core`]: constants, checksum, configuration and error types (always included)
//! - [`frame`]: frame model and wire codec (always included)
//! - [`transport`]: datagram port and UDP socket (requires `transport` feature)
//! - [`exchange`]: sender and receiver state machines (requires `transport` feature)
//! - [`endpoint`]: high-level API (requires `transport` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! use rup_protocol::prelude::*;
//!
//! let frame = Frame::builder(42)
//!     .command("CHAT")
//!     .client_name("ann")
//!     .payload(&b"HELLO"[..])
//!     .build()
//!     .unwrap();
//!
//! let bytes = frame.encode();
//! assert_eq!(bytes.len(), FRAME_SIZE);
//!
//! let decoded = Frame::decode(&bytes).unwrap();
//! assert_eq!(decoded.payload().as_bytes(), b"HELLO");
//! assert!(decoded.is_intact());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Frame model (always included)
pub mod frame;

// Transport layer (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

// Exchange state machines (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod exchange;

// Endpoint API (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod endpoint;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::constants::FRAME_SIZE;
    pub use crate::core::*;
    pub use crate::frame::*;

    #[cfg(feature = "transport")]
    pub use crate::endpoint::RupEndpoint;

    #[cfg(feature = "transport")]
    pub use crate::exchange::{
        Delivery, ExchangeError, ExchangeResult, Phase, Receiver, SendOutcome, Sender,
    };

    #[cfg(feature = "transport")]
    pub use crate::transport::{
        DatagramPort, RupSocket, RupSocketBuilder, TransportError, TransportResult,
    };

    #[cfg(feature = "simulator")]
    pub use crate::transport::{Simulator, SimulatorConfig};
}

// Re-export commonly used items at crate root
pub use crate::core::{checksum, FrameError, ProtocolConfig, RetryLimit, RupError, RupResult};
pub use crate::frame::{AckMarker, Frame, FrameBuilder, Payload};

#[cfg(feature = "transport")]
pub use crate::endpoint::RupEndpoint;

#[cfg(feature = "transport")]
pub use crate::transport::{DatagramPort, RupSocket};
