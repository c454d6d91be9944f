//! Frame-level send and wait over a datagram port.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use super::error::ExchangeResult;
use super::identity::{ExchangeId, Verdict};
use crate::frame::Frame;
use crate::transport::{DatagramPort, TransportError, TransportResult};

/// Reply observed while waiting on an exchange.
#[derive(Debug)]
pub(crate) enum Reply {
    /// The wait window closed.
    Timeout,
    /// Intact frame of the exchange.
    Frame(Frame),
    /// Corrupt or undecodable datagram from the peer.
    Damaged,
    /// Frame from the peer for another sequence id.
    Mismatch(Frame),
}

/// What a wait does with the peer's frames for other sequence ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Strays {
    /// Drop them and keep waiting.
    Drop,
    /// End the wait with [`Reply::Mismatch`].
    Report,
}

/// A port plus its receive buffer.
#[derive(Debug)]
pub(crate) struct Link<'a, P> {
    port: &'a P,
    buf: Vec<u8>,
}

impl<'a, P: DatagramPort> Link<'a, P> {
    pub(crate) fn new(port: &'a P) -> Self {
        Self {
            port,
            buf: vec![0u8; port.recv_buffer_size()],
        }
    }

    /// Transmit an encoded frame.
    pub(crate) async fn send(&self, datagram: &[u8], dest: SocketAddr) -> ExchangeResult<()> {
        self.port
            .send_to(datagram, dest)
            .await
            .map_err(TransportError::from)?;
        Ok(())
    }

    /// Wait for the next datagram of any kind, with no deadline.
    pub(crate) async fn next_any(&mut self) -> ExchangeResult<(TransportResult<Frame>, SocketAddr)> {
        loop {
            let received = self
                .port
                .recv_from(&mut self.buf, None)
                .await
                .map_err(TransportError::from)?;
            if let Some((len, source)) = received {
                return Ok((self.decode(len), source));
            }
        }
    }

    /// Wait up to `window` for a reply belonging to `id`.
    ///
    /// Datagrams from other addresses are dropped without restarting the
    /// window. The peer's frames for other sequence ids are handled per
    /// `strays`.
    pub(crate) async fn reply(
        &mut self,
        id: &ExchangeId,
        window: Duration,
        strays: Strays,
    ) -> ExchangeResult<Reply> {
        let deadline = Instant::now() + window;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(Reply::Timeout);
            }

            let received = self
                .port
                .recv_from(&mut self.buf, Some(remaining))
                .await
                .map_err(TransportError::from)?;
            let Some((len, source)) = received else {
                return Ok(Reply::Timeout);
            };

            match id.classify(self.decode(len), source) {
                Verdict::Own(frame) => return Ok(Reply::Frame(frame)),
                Verdict::Corrupt(frame) => {
                    trace!(exchange = %id, marker = %frame.marker(), "corrupt frame");
                    return Ok(Reply::Damaged);
                }
                Verdict::Malformed(err) => {
                    trace!(exchange = %id, error = %err, "malformed datagram");
                    return Ok(Reply::Damaged);
                }
                Verdict::OtherSequence(frame) if strays == Strays::Report => {
                    trace!(exchange = %id, sequence_id = frame.sequence_id(), "reply for another sequence id");
                    return Ok(Reply::Mismatch(frame));
                }
                Verdict::OtherSequence(frame) => {
                    trace!(exchange = %id, sequence_id = frame.sequence_id(), "stray frame dropped");
                }
                Verdict::Foreign => {
                    trace!(exchange = %id, %source, "foreign datagram dropped");
                }
            }
        }
    }

    fn decode(&self, len: usize) -> TransportResult<Frame> {
        if len >= self.buf.len() {
            return Err(TransportError::Truncated(len));
        }
        Ok(Frame::decode(&self.buf[..len])?)
    }
}
