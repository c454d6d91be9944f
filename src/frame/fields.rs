//! Bounded frame fields.
//!
//! Every text field and the payload occupy a fixed-width, zero-padded slot on
//! the wire. Values are checked against their slot when a frame is built and
//! copied with explicit lengths when it is encoded.

use std::borrow::Cow;

use crate::core::checksum;
use crate::core::constants::PAYLOAD_SIZE;
use crate::core::FrameError;

/// Message body of a frame.
///
/// Holds the logical bytes; the zero padding up to [`PAYLOAD_SIZE`] is
/// implicit. The wire format carries no length, so trailing zero bytes do not
/// survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    bytes: Vec<u8>,
}

impl Payload {
    /// Create a payload, rejecting bodies larger than the payload buffer.
    pub fn new(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() > PAYLOAD_SIZE {
            return Err(FrameError::FieldTooLong {
                field: "payload",
                max: PAYLOAD_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Empty payload, as carried by control frames.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rebuild a payload from a full wire buffer, trimming zero padding.
    pub(crate) fn from_buffer(buf: &[u8]) -> Self {
        let len = buf.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        Self {
            bytes: buf[..len].to_vec(),
        }
    }

    /// Logical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Logical length.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` when there are no logical bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The zero-padded buffer as it appears on the wire.
    pub fn to_buffer(&self) -> [u8; PAYLOAD_SIZE] {
        let mut buf = [0u8; PAYLOAD_SIZE];
        buf[..self.bytes.len()].copy_from_slice(&self.bytes);
        buf
    }

    /// Checksum over the full payload buffer.
    pub fn checksum(&self) -> u32 {
        checksum(&self.to_buffer())
    }

    /// Payload as text, up to the first NUL.
    pub fn to_text(&self) -> Cow<'_, str> {
        text_until_nul(&self.bytes)
    }
}

/// Check that `value` fits a NUL-terminated slot of `width` bytes.
pub(crate) fn check_text(field: &'static str, value: &str, width: usize) -> Result<(), FrameError> {
    let max = width - 1;
    if value.len() > max {
        return Err(FrameError::FieldTooLong {
            field,
            max,
            actual: value.len(),
        });
    }
    if value.as_bytes().contains(&0) {
        return Err(FrameError::InteriorNul(field));
    }
    Ok(())
}

/// Copy `value` into a zeroed slot.
pub(crate) fn write_text(slot: &mut [u8], value: &str) {
    let len = value.len().min(slot.len());
    slot.fill(0);
    slot[..len].copy_from_slice(&value.as_bytes()[..len]);
}

/// Read a slot up to its first NUL.
pub(crate) fn read_text(slot: &[u8]) -> String {
    text_until_nul(slot).into_owned()
}

fn text_until_nul(bytes: &[u8]) -> Cow<'_, str> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end])
}
