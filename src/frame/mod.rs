//! RUP Protocol - Frame Model
//!
//! A frame is one fixed-size UDP datagram. This module holds:
//!
//! - [`Frame`] and [`FrameBuilder`]: the immutable frame and its data-frame builder
//! - [`AckMarker`]: the frame's role in the handshake
//! - [`Payload`]: the bounded message body
//! - the byte-exact wire codec ([`Frame::encode`], [`Frame::decode`])
//!
//! No I/O happens here.

mod codec;
mod fields;
mod marker;
mod model;

pub use fields::Payload;
pub use marker::AckMarker;
pub use model::{Frame, FrameBuilder};
