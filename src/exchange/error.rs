//! Exchange error types.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::frame::AckMarker;
use crate::transport::TransportError;

/// Handshake phase an exchange was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Data frame out, first ACK back.
    Data,
    /// Delivery confirmation ACKs.
    DeliveryAck,
    /// FINAL_ACK teardown.
    StopAck,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => write!(f, "data"),
            Self::DeliveryAck => write!(f, "delivery-ack"),
            Self::StopAck => write!(f, "stop-ack"),
        }
    }
}

/// Errors ending an exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The socket failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The peer never answered within the retry ceiling.
    #[error("no acknowledgment in {phase} phase after {attempts} attempts")]
    Unacknowledged {
        /// Phase that gave up.
        phase: Phase,
        /// Transmissions made.
        attempts: u32,
    },

    /// Too many replies from the peer with another sequence id or a damaged
    /// frame.
    #[error("{mismatches} mismatched replies in {phase} phase")]
    MismatchLimit {
        /// Phase that gave up.
        phase: Phase,
        /// Mismatches seen.
        mismatches: u32,
    },

    /// An ACK or FINAL_ACK was handed to the sender as a message.
    #[error("cannot send a {0} frame as a message")]
    NotDataFrame(AckMarker),
}

impl ExchangeError {
    /// Check if the exchange gave up after exhausting a budget.
    pub fn is_retry_exhaustion(&self) -> bool {
        matches!(
            self,
            ExchangeError::Unacknowledged { .. } | ExchangeError::MismatchLimit { .. }
        )
    }

    /// Phase the error happened in, if it is tied to one.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            ExchangeError::Unacknowledged { phase, .. } | ExchangeError::MismatchLimit { phase, .. } => {
                Some(*phase)
            }
            _ => None,
        }
    }
}

impl From<io::Error> for ExchangeError {
    fn from(err: io::Error) -> Self {
        ExchangeError::Transport(TransportError::Io(err))
    }
}

/// Result type for exchanges.
pub type ExchangeResult<T> = Result<T, ExchangeError>;
