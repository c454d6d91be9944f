//! RUP Protocol - Exchange Layer
//!
//! One exchange moves one message between two sockets:
//!
//! - [`Sender`]: data → delivery-ack → stop-ack
//! - [`Receiver`]: await data → ack → await stop-ack
//! - [`ExchangeId`]: scoping of inbound datagrams to an exchange
//! - [`PhaseBudget`]: per-phase retry and mismatch accounting
//! - [`DeliveryLog`]: optional replay suppression
//!
//! Every wait is a single async receive with the reply timeout; there are no
//! background tasks.

mod dedup;
mod error;
mod identity;
mod link;
mod receiver;
mod retry;
mod sender;

pub use dedup::DeliveryLog;
pub use error::*;
pub use identity::{ExchangeId, Verdict};
pub use receiver::{Confirmation, Delivery, Receiver, ReceiverState};
pub use retry::PhaseBudget;
pub use sender::{PhaseAttempts, SendOutcome, Sender, SenderState};
