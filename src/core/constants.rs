//! Protocol constants for RUP.
//!
//! Field widths and marker bytes are fixed by the wire format and MUST NOT be
//! changed; peers built against the same layout rely on them.

use std::time::Duration;

// =============================================================================
// FIELD WIDTHS
// =============================================================================

/// Width of the command field.
pub const COMMAND_SIZE: usize = 20;

/// Width of the client name field.
pub const NAME_SIZE: usize = 20;

/// Width of the client credential field.
pub const CREDENTIAL_SIZE: usize = 10;

/// Width of the payload buffer.
pub const PAYLOAD_SIZE: usize = 1024;

/// Width of the encoded origin address (`sockaddr_in`).
pub const ADDRESS_SIZE: usize = 16;

/// Total size of one encoded frame, including trailing alignment padding.
pub const FRAME_SIZE: usize = 1100;

// =============================================================================
// FIELD OFFSETS
// =============================================================================

/// Offset of the checksum (u32 LE).
pub const OFF_CHECKSUM: usize = 0;

/// Offset of the sequence id (u32 LE).
pub const OFF_SEQUENCE_ID: usize = 4;

/// Offset of the command field.
pub const OFF_COMMAND: usize = 8;

/// Offset of the origin address.
pub const OFF_ORIGIN: usize = OFF_COMMAND + COMMAND_SIZE;

/// Offset of the client name field.
pub const OFF_NAME: usize = OFF_ORIGIN + ADDRESS_SIZE;

/// Offset of the client credential field.
pub const OFF_CREDENTIAL: usize = OFF_NAME + NAME_SIZE;

/// Offset of the payload buffer.
pub const OFF_PAYLOAD: usize = OFF_CREDENTIAL + CREDENTIAL_SIZE;

/// Offset of the acknowledgment marker byte.
pub const OFF_MARKER: usize = OFF_PAYLOAD + PAYLOAD_SIZE;

// =============================================================================
// MARKERS AND ADDRESS FAMILIES
// =============================================================================

/// Marker byte of a data frame.
pub const MARKER_NONE: u8 = 0;

/// Marker byte of an acknowledgment frame.
pub const MARKER_ACK: u8 = b'Z';

/// Marker byte of a stop-ack frame.
pub const MARKER_FINAL_ACK: u8 = b'X';

/// `AF_INET`, as stored in the origin address.
pub const AF_INET: u16 = 2;

// =============================================================================
// TIMING AND RETRY DEFAULTS
// =============================================================================

/// How long each phase waits for a reply before retransmitting.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_millis(100);

/// Transmission ceiling for the data and delivery-ack phases.
pub const DEFAULT_HANDSHAKE_ATTEMPTS: u32 = 50;

/// Attempts made in either stop-ack phase before giving up (benignly).
pub const STOP_ATTEMPTS: u32 = 3;

/// Mismatched replies tolerated by the receiver while awaiting the delivery ack.
pub const MISMATCH_LIMIT: u32 = 3;

/// Default retention of completed exchanges in the delivery log.
pub const DEFAULT_DELIVERY_RETENTION: Duration = Duration::from_secs(30);

/// Default number of completed exchanges remembered by the delivery log.
pub const DEFAULT_DELIVERY_CAPACITY: usize = 64;

// =============================================================================
// WELL-KNOWN PORTS
// =============================================================================

/// Application-level port conventions. The protocol itself is port-agnostic.
pub mod ports {
    /// Login service.
    pub const SERVER_LOGIN: u16 = 10000;

    /// Chat service.
    pub const SERVER_CHAT: u16 = 10001;

    /// Client-side chat listener.
    pub const CLIENT_CHAT: u16 = 10002;
}
