//! Receiver-side handshake.
//!
//! [`Receiver::receive`] loops until one message has completed the data and
//! delivery-ack phases, then runs the stop-ack phase and hands the message
//! to the caller. An exchange that aborts in the delivery-ack phase is
//! abandoned and the receiver goes back to waiting for data.

use std::net::SocketAddr;

use tracing::{debug, trace, warn};

use super::dedup::DeliveryLog;
use super::error::{ExchangeResult, Phase};
use super::identity::ExchangeId;
use super::link::{Link, Reply, Strays};
use super::retry::PhaseBudget;
use crate::core::{ProtocolConfig, RetryLimit};
use crate::frame::{AckMarker, Frame};
use crate::transport::DatagramPort;

/// Receiver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiverState {
    /// Blocking until a data frame arrives.
    #[default]
    AwaitData,
    /// Checking a received frame.
    Validate,
    /// Acknowledging the data frame.
    SendAck,
    /// Waiting for FINAL_ACK.
    AwaitStopAck,
    /// Message handed over.
    Done,
}

/// How the delivery-ack phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The sender confirmed with an ACK; the stop-ack phase follows.
    Acknowledged,
    /// The sender already sent FINAL_ACK; the stop handshake is complete.
    Stopped,
}

/// A message that completed the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// The data frame.
    pub frame: Frame,
    /// Transport address it came from.
    pub peer: SocketAddr,
    /// `true` when the FINAL_ACK exchange completed.
    pub stop_confirmed: bool,
}

/// Stop-and-wait receiver over a datagram port.
#[derive(Debug)]
pub struct Receiver<'a, P> {
    link: Link<'a, P>,
    config: &'a ProtocolConfig,
    log: Option<&'a mut DeliveryLog>,
    state: ReceiverState,
}

impl<'a, P: DatagramPort> Receiver<'a, P> {
    /// Create a receiver on `port`.
    pub fn new(port: &'a P, config: &'a ProtocolConfig) -> Self {
        Self {
            link: Link::new(port),
            config,
            log: None,
            state: ReceiverState::default(),
        }
    }

    /// Suppress re-delivery of exchanges recorded in `log`.
    pub fn with_delivery_log(mut self, log: &'a mut DeliveryLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Current state.
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Receive one message.
    ///
    /// Returns only after a message passed the data and delivery-ack
    /// phases. Fails only on a socket error.
    pub async fn receive(&mut self) -> ExchangeResult<Delivery> {
        loop {
            let (frame, peer) = self.await_data().await?;
            let id = ExchangeId::of(&frame, peer);

            let replay = match self.log.as_deref_mut() {
                Some(log) => log.contains(&id),
                None => false,
            };

            let confirmation = match self.acknowledge(&frame, &id).await {
                Ok(confirmation) => confirmation,
                Err(err) if err.is_retry_exhaustion() => {
                    warn!(exchange = %id, error = %err, "exchange abandoned, awaiting data again");
                    self.state = ReceiverState::AwaitData;
                    continue;
                }
                Err(err) => return Err(err),
            };

            let stop_confirmed = match confirmation {
                Confirmation::Stopped => true,
                Confirmation::Acknowledged => self.await_stop(&frame, &id).await?,
            };

            if replay {
                debug!(exchange = %id, "replayed exchange re-acknowledged, not delivered");
                self.state = ReceiverState::AwaitData;
                continue;
            }

            if let Some(log) = self.log.as_deref_mut() {
                log.record(id);
            }
            self.state = ReceiverState::Done;
            debug!(exchange = %id, stop_confirmed, "message received");
            return Ok(Delivery {
                frame,
                peer,
                stop_confirmed,
            });
        }
    }

    /// Phase 1: wait, without a deadline, for an intact data frame.
    ///
    /// Control frames, corrupt frames and undecodable datagrams are dropped.
    pub async fn await_data(&mut self) -> ExchangeResult<(Frame, SocketAddr)> {
        loop {
            self.state = ReceiverState::AwaitData;
            let (decoded, source) = self.link.next_any().await?;

            self.state = ReceiverState::Validate;
            match decoded {
                Ok(frame) if frame.is_control() => {
                    trace!(%source, marker = %frame.marker(), "control frame outside exchange");
                }
                Ok(frame) if !frame.is_intact() => {
                    trace!(%source, sequence_id = frame.sequence_id(), "corrupt data frame");
                }
                Ok(frame) => {
                    debug!(%source, sequence_id = frame.sequence_id(), "data frame received");
                    return Ok((frame, source));
                }
                Err(err) => {
                    trace!(%source, error = %err, "malformed datagram");
                }
            }
        }
    }

    /// Phase 2: acknowledge `data` until the sender confirms.
    ///
    /// Timeouts resend the ACK against the handshake limit. Replies from the
    /// peer that carry another sequence id, fail the checksum or do not
    /// decode resend it against the mismatch limit. A retransmitted copy of
    /// the data frame resends it for free. Other addresses are ignored.
    pub async fn acknowledge(&mut self, data: &Frame, id: &ExchangeId) -> ExchangeResult<Confirmation> {
        self.state = ReceiverState::SendAck;
        let ack = Frame::control(AckMarker::Ack, data).encode();
        let mut budget = PhaseBudget::new(Phase::DeliveryAck, self.config.handshake_limit)
            .with_mismatch_limit(self.config.mismatch_limit);

        budget.next_attempt()?;
        self.link.send(&ack, id.peer).await?;

        loop {
            match self.link.reply(id, self.config.reply_timeout, Strays::Report).await? {
                Reply::Frame(reply) => match reply.marker() {
                    AckMarker::Ack => {
                        debug!(exchange = %id, attempts = budget.attempts(), "delivery confirmed");
                        return Ok(Confirmation::Acknowledged);
                    }
                    AckMarker::FinalAck => {
                        self.echo_final_ack(data, id).await?;
                        debug!(exchange = %id, "FINAL_ACK during delivery-ack phase");
                        return Ok(Confirmation::Stopped);
                    }
                    AckMarker::None => {
                        trace!(exchange = %id, "data retransmission, resending ACK");
                    }
                },
                Reply::Mismatch(reply) => {
                    let mismatches = budget.record_mismatch()?;
                    trace!(exchange = %id, mismatches, sequence_id = reply.sequence_id(), "mismatched reply");
                }
                Reply::Damaged => {
                    let mismatches = budget.record_mismatch()?;
                    trace!(exchange = %id, mismatches, "damaged reply");
                }
                Reply::Timeout => {
                    let attempt = budget.next_attempt()?;
                    trace!(exchange = %id, attempt, "ACK timed out");
                }
            }
            self.link.send(&ack, id.peer).await?;
        }
    }

    /// Phase 3: keep acknowledging until FINAL_ACK or `stop_attempts` run out.
    ///
    /// Returns whether FINAL_ACK arrived. A received FINAL_ACK is echoed once.
    pub async fn await_stop(&mut self, data: &Frame, id: &ExchangeId) -> ExchangeResult<bool> {
        self.state = ReceiverState::AwaitStopAck;
        let ack = Frame::control(AckMarker::Ack, data).encode();
        let mut budget =
            PhaseBudget::new(Phase::StopAck, RetryLimit::Attempts(self.config.stop_attempts));

        while let Ok(attempt) = budget.next_attempt() {
            self.link.send(&ack, id.peer).await?;

            loop {
                match self.link.reply(id, self.config.reply_timeout, Strays::Drop).await? {
                    Reply::Frame(reply) if reply.marker() == AckMarker::FinalAck => {
                        self.echo_final_ack(data, id).await?;
                        debug!(exchange = %id, attempt, "stop-ack confirmed");
                        return Ok(true);
                    }
                    Reply::Damaged | Reply::Mismatch(_) => continue,
                    Reply::Frame(_) | Reply::Timeout => break,
                }
            }
        }

        debug!(exchange = %id, attempts = budget.attempts(), "stop-ack not confirmed");
        Ok(false)
    }

    async fn echo_final_ack(&self, data: &Frame, id: &ExchangeId) -> ExchangeResult<()> {
        let echo = Frame::control(AckMarker::FinalAck, data);
        self.link.send(&echo.encode(), id.peer).await
    }
}
