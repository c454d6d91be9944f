//! Wire encoding for [`Frame`].
//!
//! Byte layout (1100 bytes, little-endian integers, C struct alignment):
//!
//! ```text
//! +----------+-------------+---------+-------------+--------+------------+---------+--------+-----+
//! | checksum | sequence_id | command | origin      | name   | credential | payload | marker | pad |
//! | u32 LE   | u32 LE      | 20      | sockaddr_in | 20     | 10         | 1024    | 1      | 1   |
//! +----------+-------------+---------+-------------+--------+------------+---------+--------+-----+
//! ```
//!
//! The origin is a `sockaddr_in`: family (u16 LE), port (u16 BE), IPv4
//! address (4 bytes, network order), 8 zero bytes.

use std::net::{Ipv4Addr, SocketAddrV4};

use super::fields::{read_text, write_text, Payload};
use super::marker::AckMarker;
use super::model::Frame;
use crate::core::constants::{
    ADDRESS_SIZE, AF_INET, COMMAND_SIZE, CREDENTIAL_SIZE, FRAME_SIZE, NAME_SIZE, OFF_CHECKSUM,
    OFF_COMMAND, OFF_CREDENTIAL, OFF_MARKER, OFF_NAME, OFF_ORIGIN, OFF_PAYLOAD, OFF_SEQUENCE_ID,
    PAYLOAD_SIZE,
};
use crate::core::FrameError;

impl Frame {
    /// Serialize to the fixed wire layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; FRAME_SIZE];

        buf[OFF_CHECKSUM..OFF_CHECKSUM + 4].copy_from_slice(&self.checksum.to_le_bytes());
        buf[OFF_SEQUENCE_ID..OFF_SEQUENCE_ID + 4].copy_from_slice(&self.sequence_id.to_le_bytes());
        write_text(&mut buf[OFF_COMMAND..OFF_COMMAND + COMMAND_SIZE], &self.command);
        encode_origin(&mut buf[OFF_ORIGIN..OFF_ORIGIN + ADDRESS_SIZE], self.origin);
        write_text(&mut buf[OFF_NAME..OFF_NAME + NAME_SIZE], &self.client_name);
        write_text(
            &mut buf[OFF_CREDENTIAL..OFF_CREDENTIAL + CREDENTIAL_SIZE],
            &self.client_credential,
        );
        buf[OFF_PAYLOAD..OFF_PAYLOAD + PAYLOAD_SIZE].copy_from_slice(&self.payload.to_buffer());
        buf[OFF_MARKER] = self.marker.as_byte();

        buf
    }

    /// Parse a datagram.
    ///
    /// The checksum is read but not verified; see [`Frame::is_intact`].
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() != FRAME_SIZE {
            return Err(FrameError::WrongSize {
                expected: FRAME_SIZE,
                actual: buf.len(),
            });
        }

        let marker = AckMarker::from_byte(buf[OFF_MARKER])
            .ok_or(FrameError::InvalidMarker(buf[OFF_MARKER]))?;
        let origin = decode_origin(&buf[OFF_ORIGIN..OFF_ORIGIN + ADDRESS_SIZE])?;

        Ok(Self {
            checksum: read_u32(buf, OFF_CHECKSUM),
            sequence_id: read_u32(buf, OFF_SEQUENCE_ID),
            command: read_text(&buf[OFF_COMMAND..OFF_COMMAND + COMMAND_SIZE]),
            origin,
            client_name: read_text(&buf[OFF_NAME..OFF_NAME + NAME_SIZE]),
            client_credential: read_text(&buf[OFF_CREDENTIAL..OFF_CREDENTIAL + CREDENTIAL_SIZE]),
            payload: Payload::from_buffer(&buf[OFF_PAYLOAD..OFF_PAYLOAD + PAYLOAD_SIZE]),
            marker,
        })
    }
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn encode_origin(slot: &mut [u8], origin: SocketAddrV4) {
    slot.fill(0);
    slot[0..2].copy_from_slice(&AF_INET.to_le_bytes());
    slot[2..4].copy_from_slice(&origin.port().to_be_bytes());
    slot[4..8].copy_from_slice(&origin.ip().octets());
}

fn decode_origin(slot: &[u8]) -> Result<SocketAddrV4, FrameError> {
    let family = u16::from_le_bytes([slot[0], slot[1]]);
    // Zeroed addresses (family 0) come from peers that never set an origin.
    if family != AF_INET && family != 0 {
        return Err(FrameError::UnsupportedFamily(family));
    }
    let port = u16::from_be_bytes([slot[2], slot[3]]);
    let ip = Ipv4Addr::new(slot[4], slot[5], slot[6], slot[7]);
    Ok(SocketAddrV4::new(ip, port))
}
