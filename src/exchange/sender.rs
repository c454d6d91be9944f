//! Sender-side handshake.
//!
//! One call to [`Sender::send`] moves a single data frame through three
//! phases:
//!
//! 1. **Data**: transmit the frame until the peer's ACK arrives.
//! 2. **Delivery ack**: tell the peer its ACK was seen, until it answers
//!    with another ACK.
//! 3. **Stop ack**: a few FINAL_ACK transmissions so the peer can stop
//!    acknowledging. Running out of attempts here is not an error.

use std::net::SocketAddr;

use tracing::{debug, trace, warn};

use super::error::{ExchangeError, ExchangeResult, Phase};
use super::identity::ExchangeId;
use super::link::{Link, Reply, Strays};
use super::retry::PhaseBudget;
use crate::core::{ProtocolConfig, RetryLimit};
use crate::frame::{AckMarker, Frame};
use crate::transport::DatagramPort;

/// Sender lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SenderState {
    /// Ready to transmit the data frame.
    #[default]
    SendData,
    /// Waiting for the ACK of the data frame.
    AwaitDataAck,
    /// Ready to confirm delivery.
    SendDeliveryAck,
    /// Waiting for the peer to confirm our ACK.
    AwaitDeliveryAckConfirm,
    /// Tearing down with FINAL_ACK.
    SendStopAck,
    /// Message delivered.
    Done,
    /// Gave up or the socket failed.
    Failed,
}

/// Transmissions made in each phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseAttempts {
    /// Data frame transmissions.
    pub data: u32,
    /// Delivery ACK transmissions.
    pub delivery: u32,
    /// FINAL_ACK transmissions.
    pub stop: u32,
}

/// Result of a completed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOutcome {
    /// `true` when the peer answered the FINAL_ACK.
    pub stop_confirmed: bool,
    /// Transmission counts per phase.
    pub attempts: PhaseAttempts,
}

/// Stop-and-wait sender over a datagram port.
#[derive(Debug)]
pub struct Sender<'a, P> {
    link: Link<'a, P>,
    config: &'a ProtocolConfig,
    state: SenderState,
}

impl<'a, P: DatagramPort> Sender<'a, P> {
    /// Create a sender on `port`.
    pub fn new(port: &'a P, config: &'a ProtocolConfig) -> Self {
        Self {
            link: Link::new(port),
            config,
            state: SenderState::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Deliver `frame` to `dest` exactly once.
    ///
    /// Fails only if the data or delivery-ack phase runs out of attempts,
    /// the socket fails, or `frame` is not a data frame.
    pub async fn send(&mut self, frame: &Frame, dest: SocketAddr) -> ExchangeResult<SendOutcome> {
        if frame.is_control() {
            return Err(ExchangeError::NotDataFrame(frame.marker()));
        }
        self.state = SenderState::SendData;

        let id = ExchangeId::of(frame, dest);
        let result = self.run(frame, &id).await;
        match &result {
            Ok(outcome) => {
                self.state = SenderState::Done;
                debug!(
                    exchange = %id,
                    stop_confirmed = outcome.stop_confirmed,
                    "message delivered"
                );
            }
            Err(err) => {
                self.state = SenderState::Failed;
                warn!(exchange = %id, error = %err, "send failed");
            }
        }
        result
    }

    async fn run(&mut self, frame: &Frame, id: &ExchangeId) -> ExchangeResult<SendOutcome> {
        let data = self.send_data(frame, id).await?;
        let delivery = self.confirm_delivery(frame, id).await?;
        let (stop_confirmed, stop) = self.stop(frame, id).await?;

        Ok(SendOutcome {
            stop_confirmed,
            attempts: PhaseAttempts {
                data,
                delivery,
                stop,
            },
        })
    }

    /// Phase 1: transmit `frame` until a matching ACK arrives.
    ///
    /// Returns the number of transmissions.
    pub async fn send_data(&mut self, frame: &Frame, id: &ExchangeId) -> ExchangeResult<u32> {
        let budget = PhaseBudget::new(Phase::Data, self.config.handshake_limit);
        self.state = SenderState::AwaitDataAck;
        self.until_ack(&frame.encode(), id, budget).await
    }

    /// Phase 2: send ACK until the peer answers with a matching ACK.
    ///
    /// Returns the number of transmissions.
    pub async fn confirm_delivery(&mut self, frame: &Frame, id: &ExchangeId) -> ExchangeResult<u32> {
        self.state = SenderState::SendDeliveryAck;
        let ack = Frame::control(AckMarker::Ack, frame);
        let budget = PhaseBudget::new(Phase::DeliveryAck, self.config.handshake_limit);
        self.state = SenderState::AwaitDeliveryAckConfirm;
        self.until_ack(&ack.encode(), id, budget).await
    }

    /// Phase 3: send FINAL_ACK up to `stop_attempts` times.
    ///
    /// Returns whether the peer echoed it, and the number of transmissions.
    pub async fn stop(&mut self, frame: &Frame, id: &ExchangeId) -> ExchangeResult<(bool, u32)> {
        self.state = SenderState::SendStopAck;
        let datagram = Frame::control(AckMarker::FinalAck, frame).encode();
        let mut budget =
            PhaseBudget::new(Phase::StopAck, RetryLimit::Attempts(self.config.stop_attempts));

        while let Ok(attempt) = budget.next_attempt() {
            self.link.send(&datagram, id.peer).await?;
            trace!(exchange = %id, attempt, "FINAL_ACK sent");

            loop {
                match self.link.reply(id, self.config.reply_timeout, Strays::Drop).await? {
                    Reply::Frame(reply) if reply.marker() == AckMarker::FinalAck => {
                        return Ok((true, attempt));
                    }
                    Reply::Damaged | Reply::Mismatch(_) => continue,
                    Reply::Frame(_) | Reply::Timeout => break,
                }
            }
        }

        debug!(exchange = %id, attempts = budget.attempts(), "stop-ack not confirmed");
        Ok((false, budget.attempts()))
    }

    /// Retransmit `datagram` until an ACK of the exchange arrives.
    async fn until_ack(
        &mut self,
        datagram: &[u8],
        id: &ExchangeId,
        mut budget: PhaseBudget,
    ) -> ExchangeResult<u32> {
        loop {
            let attempt = budget.next_attempt()?;
            self.link.send(datagram, id.peer).await?;
            trace!(exchange = %id, phase = %budget.phase(), attempt, "frame sent");

            loop {
                match self.link.reply(id, self.config.reply_timeout, Strays::Drop).await? {
                    Reply::Frame(reply) if reply.marker() == AckMarker::Ack => {
                        debug!(exchange = %id, phase = %budget.phase(), attempt, "ACK received");
                        return Ok(attempt);
                    }
                    Reply::Damaged | Reply::Mismatch(_) => continue,
                    Reply::Frame(reply) => {
                        trace!(exchange = %id, marker = %reply.marker(), "unexpected reply");
                        break;
                    }
                    Reply::Timeout => break,
                }
            }
        }
    }
}
