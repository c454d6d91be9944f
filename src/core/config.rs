//! Runtime retry and timing policy.
//!
//! [`ProtocolConfig`] carries every tunable of an exchange. The defaults
//! bound every wait; [`ProtocolConfig::reference`] restores the unbounded
//! retry loops of the original protocol.

use std::time::Duration;

use super::constants;
use super::error::RupError;

/// Ceiling on retransmissions in a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryLimit {
    /// Retry until the peer answers.
    Unbounded,
    /// Give up after this many transmissions.
    Attempts(u32),
}

impl RetryLimit {
    /// Check whether transmission number `attempt` (1-based) may go out.
    pub fn allows(self, attempt: u32) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Attempts(max) => attempt <= max,
        }
    }
}

impl Default for RetryLimit {
    fn default() -> Self {
        Self::Attempts(constants::DEFAULT_HANDSHAKE_ATTEMPTS)
    }
}

/// Settings for the optional delivery log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryLogConfig {
    /// How long a completed exchange is remembered.
    pub retention: Duration,
    /// Maximum number of remembered exchanges.
    pub capacity: usize,
}

impl Default for DeliveryLogConfig {
    fn default() -> Self {
        Self {
            retention: constants::DEFAULT_DELIVERY_RETENTION,
            capacity: constants::DEFAULT_DELIVERY_CAPACITY,
        }
    }
}

/// Timing and retry policy shared by both state machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Wait window for each reply.
    pub reply_timeout: Duration,
    /// Ceiling for the data and delivery-ack phases, and for receiver
    /// timeouts while awaiting the delivery ack.
    pub handshake_limit: RetryLimit,
    /// Attempts in each stop-ack phase.
    pub stop_attempts: u32,
    /// Mismatched replies the receiver tolerates while awaiting the delivery ack.
    pub mismatch_limit: u32,
    /// De-duplication of replayed exchanges. Disabled when `None`.
    pub delivery_log: Option<DeliveryLogConfig>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            reply_timeout: constants::DEFAULT_REPLY_TIMEOUT,
            handshake_limit: RetryLimit::default(),
            stop_attempts: constants::STOP_ATTEMPTS,
            mismatch_limit: constants::MISMATCH_LIMIT,
            delivery_log: None,
        }
    }
}

impl ProtocolConfig {
    /// Default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Original behavior: the data and delivery-ack phases retry forever.
    pub fn reference() -> Self {
        Self {
            handshake_limit: RetryLimit::Unbounded,
            ..Self::default()
        }
    }

    /// Set the reply timeout.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Set the handshake retry ceiling.
    pub fn with_handshake_limit(mut self, limit: RetryLimit) -> Self {
        self.handshake_limit = limit;
        self
    }

    /// Set the number of stop-ack attempts.
    pub fn with_stop_attempts(mut self, attempts: u32) -> Self {
        self.stop_attempts = attempts;
        self
    }

    /// Set the mismatch budget of the receiver.
    pub fn with_mismatch_limit(mut self, limit: u32) -> Self {
        self.mismatch_limit = limit;
        self
    }

    /// Enable the delivery log.
    pub fn with_delivery_log(mut self, log: DeliveryLogConfig) -> Self {
        self.delivery_log = Some(log);
        self
    }

    /// Check the policy for values that would stall or never complete a phase.
    pub fn validate(&self) -> Result<(), RupError> {
        if self.reply_timeout.is_zero() {
            return Err(RupError::Config("reply timeout must be non-zero".into()));
        }
        if self.handshake_limit == RetryLimit::Attempts(0) {
            return Err(RupError::Config(
                "handshake limit must allow at least one attempt".into(),
            ));
        }
        if self.stop_attempts == 0 {
            return Err(RupError::Config("stop attempts must be non-zero".into()));
        }
        if self.mismatch_limit == 0 {
            return Err(RupError::Config("mismatch limit must be non-zero".into()));
        }
        if self.delivery_log.is_some_and(|log| log.capacity == 0) {
            return Err(RupError::Config(
                "delivery log capacity must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
