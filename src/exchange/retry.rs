//! Per-phase retry accounting.

use crate::core::RetryLimit;

use super::error::{ExchangeError, Phase};

/// Transmission and mismatch counters owned by one running phase.
///
/// A budget starts empty for every phase; nothing carries over between
/// phases or exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseBudget {
    phase: Phase,
    limit: RetryLimit,
    mismatch_limit: Option<u32>,
    attempts: u32,
    mismatches: u32,
}

impl PhaseBudget {
    /// Create a budget for `phase` allowing `limit` transmissions.
    pub fn new(phase: Phase, limit: RetryLimit) -> Self {
        Self {
            phase,
            limit,
            mismatch_limit: None,
            attempts: 0,
            mismatches: 0,
        }
    }

    /// Abort the phase once `limit` mismatched replies have been seen.
    pub fn with_mismatch_limit(mut self, limit: u32) -> Self {
        self.mismatch_limit = Some(limit);
        self
    }

    /// Claim the next transmission.
    ///
    /// Returns the 1-based attempt number, or
    /// [`ExchangeError::Unacknowledged`] once the limit is spent.
    pub fn next_attempt(&mut self) -> Result<u32, ExchangeError> {
        let next = self.attempts.saturating_add(1);
        if !self.limit.allows(next) {
            return Err(ExchangeError::Unacknowledged {
                phase: self.phase,
                attempts: self.attempts,
            });
        }
        self.attempts = next;
        Ok(next)
    }

    /// Count one mismatched reply.
    ///
    /// Returns [`ExchangeError::MismatchLimit`] when this mismatch reaches
    /// the limit.
    pub fn record_mismatch(&mut self) -> Result<u32, ExchangeError> {
        self.mismatches = self.mismatches.saturating_add(1);
        match self.mismatch_limit {
            Some(limit) if self.mismatches >= limit => Err(ExchangeError::MismatchLimit {
                phase: self.phase,
                mismatches: self.mismatches,
            }),
            _ => Ok(self.mismatches),
        }
    }

    /// Phase this budget belongs to.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Transmissions made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Mismatched replies seen so far.
    pub fn mismatches(&self) -> u32 {
        self.mismatches
    }
}
