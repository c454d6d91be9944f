//! The datagram endpoint consumed by the exchange state machines.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use crate::core::constants::FRAME_SIZE;

/// An open, bound datagram endpoint with UDP semantics.
///
/// No delivery, ordering or duplicate guarantees are assumed; datagram
/// boundaries are preserved.
pub trait DatagramPort: Send + Sync {
    /// Send one datagram to `dest`.
    fn send_to(&self, datagram: &[u8], dest: SocketAddr)
    -> impl Future<Output = io::Result<()>> + Send;

    /// Receive one datagram into `buf`.
    ///
    /// Returns `Ok(None)` when `timeout` elapses first. With no timeout the
    /// call waits until a datagram arrives.
    fn recv_from(
        &self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> impl Future<Output = io::Result<Option<(usize, SocketAddr)>>> + Send;

    /// Address this endpoint is bound to.
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Receive buffer size for exchanges on this endpoint.
    ///
    /// Must exceed one frame so that oversized datagrams can be told apart.
    fn recv_buffer_size(&self) -> usize {
        FRAME_SIZE + 1
    }
}
