//! The frame: one datagram of the protocol.

use std::net::{Ipv4Addr, SocketAddrV4};

use super::fields::{check_text, Payload};
use super::marker::AckMarker;
use crate::core::constants::{COMMAND_SIZE, CREDENTIAL_SIZE, NAME_SIZE};
use crate::core::FrameError;

/// One protocol datagram.
///
/// Frames are immutable. Application code creates data frames with
/// [`Frame::builder`]; the marker and checksum are always filled in by the
/// protocol layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub(super) sequence_id: u32,
    pub(super) command: String,
    pub(super) origin: SocketAddrV4,
    pub(super) client_name: String,
    pub(super) client_credential: String,
    pub(super) payload: Payload,
    pub(super) marker: AckMarker,
    pub(super) checksum: u32,
}

impl Frame {
    /// Start building a data frame for exchange `sequence_id`.
    pub fn builder(sequence_id: u32) -> FrameBuilder {
        FrameBuilder::new(sequence_id)
    }

    /// Build the control frame answering `frame`.
    ///
    /// The sequence id and identity fields are copied; command and payload
    /// are empty and the checksum is that of the empty payload. The state
    /// machines use this for every ACK and FINAL_ACK they send.
    pub fn control(marker: AckMarker, frame: &Frame) -> Self {
        let payload = Payload::empty();
        Self {
            sequence_id: frame.sequence_id,
            command: String::new(),
            origin: frame.origin,
            client_name: frame.client_name.clone(),
            client_credential: frame.client_credential.clone(),
            checksum: payload.checksum(),
            payload,
            marker,
        }
    }

    /// Exchange this frame belongs to.
    pub fn sequence_id(&self) -> u32 {
        self.sequence_id
    }

    /// Application command tag.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Sender address claimed inside the frame.
    pub fn origin(&self) -> SocketAddrV4 {
        self.origin
    }

    /// Client name.
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Client credential.
    pub fn client_credential(&self) -> &str {
        &self.client_credential
    }

    /// Message body.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Role in the handshake.
    pub fn marker(&self) -> AckMarker {
        self.marker
    }

    /// Carried checksum.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// `true` for ACK and FINAL_ACK frames.
    pub fn is_control(&self) -> bool {
        self.marker.is_control()
    }

    /// `true` when the carried checksum matches the payload.
    pub fn is_intact(&self) -> bool {
        self.payload.checksum() == self.checksum
    }
}

/// Builder for data frames.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    sequence_id: u32,
    command: String,
    origin: SocketAddrV4,
    client_name: String,
    client_credential: String,
    payload: Vec<u8>,
}

impl FrameBuilder {
    /// Create a builder with empty fields and an unspecified origin.
    pub fn new(sequence_id: u32) -> Self {
        Self {
            sequence_id,
            command: String::new(),
            origin: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
            client_name: String::new(),
            client_credential: String::new(),
            payload: Vec::new(),
        }
    }

    /// Set the command tag.
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Set the claimed sender address.
    pub fn origin(mut self, origin: SocketAddrV4) -> Self {
        self.origin = origin;
        self
    }

    /// Set the client name.
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Set the client credential.
    pub fn client_credential(mut self, credential: impl Into<String>) -> Self {
        self.client_credential = credential.into();
        self
    }

    /// Set the message body.
    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Validate field widths and produce a data frame with its checksum.
    pub fn build(self) -> Result<Frame, FrameError> {
        check_text("command", &self.command, COMMAND_SIZE)?;
        check_text("client_name", &self.client_name, NAME_SIZE)?;
        check_text("client_credential", &self.client_credential, CREDENTIAL_SIZE)?;
        let payload = Payload::new(&self.payload)?;

        Ok(Frame {
            sequence_id: self.sequence_id,
            command: self.command,
            origin: self.origin,
            client_name: self.client_name,
            client_credential: self.client_credential,
            checksum: payload.checksum(),
            payload,
            marker: AckMarker::None,
        })
    }
}
