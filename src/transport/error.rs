//! Transport layer error types.
//!
//! Malformed datagrams are never reported to the application; the state
//! machines drop them and keep waiting.

use std::io;

use thiserror::Error;

use crate::core::FrameError;

/// Transport layer errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Frame parsing error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// I/O error (socket operations).
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Datagram claimed more bytes than the receive buffer holds.
    #[error("datagram truncated at {0} bytes")]
    Truncated(usize),
}

impl TransportError {
    /// Check if this error should result in silent drop (no response sent).
    pub fn is_silent_drop(&self) -> bool {
        matches!(self, TransportError::Frame(_) | TransportError::Truncated(_))
    }

    /// Check if this error is fatal to the exchange.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::Io(_))
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_drop_errors() {
        assert!(TransportError::Frame(FrameError::InvalidMarker(b'Q')).is_silent_drop());
        assert!(TransportError::Truncated(2048).is_silent_drop());

        assert!(!TransportError::Io(io::Error::other("test")).is_silent_drop());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(TransportError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset")).is_fatal());

        assert!(!TransportError::Frame(FrameError::NotIpv4).is_fatal());
        assert!(!TransportError::Truncated(0).is_fatal());
    }
}
