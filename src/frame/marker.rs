//! Acknowledgment marker carried in the last byte of every frame.

use crate::core::constants::{MARKER_ACK, MARKER_FINAL_ACK, MARKER_NONE};

/// Role of a frame in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum AckMarker {
    /// Data frame.
    #[default]
    None = MARKER_NONE,
    /// Acknowledgment (`'Z'`).
    Ack = MARKER_ACK,
    /// Stop-ack (`'X'`).
    FinalAck = MARKER_FINAL_ACK,
}

impl AckMarker {
    /// Parse a marker from its wire byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            MARKER_NONE => Some(Self::None),
            MARKER_ACK => Some(Self::Ack),
            MARKER_FINAL_ACK => Some(Self::FinalAck),
            _ => None,
        }
    }

    /// Wire byte of this marker.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// `true` for `Ack` and `FinalAck`.
    pub fn is_control(self) -> bool {
        self != Self::None
    }
}

impl std::fmt::Display for AckMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "DATA"),
            Self::Ack => write!(f, "ACK"),
            Self::FinalAck => write!(f, "FINAL_ACK"),
        }
    }
}
