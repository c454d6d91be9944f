//! Exchange identity and inbound classification.

use std::fmt;
use std::net::SocketAddr;

use crate::frame::Frame;
use crate::transport::{TransportError, TransportResult};

/// Identity of one exchange: the sequence id and the peer's transport address.
///
/// A frame belongs to the exchange only if its sequence id and the source
/// ip and port of its datagram all match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExchangeId {
    /// Sequence id shared by every frame of the exchange.
    pub sequence_id: u32,
    /// Transport address of the other side.
    pub peer: SocketAddr,
}

/// What an inbound datagram means to the current exchange.
#[derive(Debug)]
pub enum Verdict {
    /// Intact frame of this exchange.
    Own(Frame),
    /// Frame of this exchange whose checksum does not match its payload.
    Corrupt(Frame),
    /// Undecodable datagram from the peer.
    Malformed(TransportError),
    /// Frame from the peer carrying another sequence id.
    OtherSequence(Frame),
    /// Anything from another peer.
    Foreign,
}

impl ExchangeId {
    /// Create an exchange identity.
    pub fn new(sequence_id: u32, peer: SocketAddr) -> Self {
        Self { sequence_id, peer }
    }

    /// Identity of the exchange `frame` opens when it arrives from `peer`.
    pub fn of(frame: &Frame, peer: SocketAddr) -> Self {
        Self::new(frame.sequence_id(), peer)
    }

    /// Check whether `source` is this exchange's peer (ip and port).
    pub fn is_peer(&self, source: SocketAddr) -> bool {
        self.peer == source
    }

    /// Classify a decoded (or failed) datagram received from `source`.
    pub fn classify(&self, decoded: TransportResult<Frame>, source: SocketAddr) -> Verdict {
        if !self.is_peer(source) {
            return Verdict::Foreign;
        }
        match decoded {
            Err(err) => Verdict::Malformed(err),
            Ok(frame) if frame.sequence_id() != self.sequence_id => Verdict::OtherSequence(frame),
            Ok(frame) if !frame.is_intact() => Verdict::Corrupt(frame),
            Ok(frame) => Verdict::Own(frame),
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.sequence_id, self.peer)
    }
}
