//! Error types for RUP protocol.

use thiserror::Error;

/// Errors building or parsing a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Datagram length differs from the fixed frame size.
    #[error("wrong frame size: expected {expected}, got {actual}")]
    WrongSize {
        /// Expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// A bounded field was given more bytes than it can hold.
    #[error("{field} too long: at most {max} bytes, got {actual}")]
    FieldTooLong {
        /// Field name.
        field: &'static str,
        /// Maximum accepted length.
        max: usize,
        /// Length supplied.
        actual: usize,
    },

    /// A text field contains a NUL byte, which would truncate it on the wire.
    #[error("{0} contains a NUL byte")]
    InteriorNul(&'static str),

    /// Unknown acknowledgment marker byte.
    #[error("invalid ack marker: {0:#04x}")]
    InvalidMarker(u8),

    /// Origin address family is not AF_INET.
    #[error("unsupported address family: {0}")]
    UnsupportedFamily(u16),

    /// Origin address is not IPv4.
    #[error("origin address must be IPv4")]
    NotIpv4,
}

/// Top-level RUP errors.
#[derive(Debug, Error)]
pub enum RupError {
    /// Frame error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Transport error.
    #[cfg(feature = "transport")]
    #[error("transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    /// Exchange error.
    #[cfg(feature = "transport")]
    #[error("exchange error: {0}")]
    Exchange(#[from] crate::exchange::ExchangeError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for crate-level operations.
pub type RupResult<T> = Result<T, RupError>;
