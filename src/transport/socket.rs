//! Async UDP socket wrapper for RUP transport.
//!
//! [`RupSocket`] is the production [`DatagramPort`]: open, bind, send-to,
//! receive-from with an optional timeout, close.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;

use super::port::DatagramPort;
use crate::core::constants::FRAME_SIZE;

/// Default receive buffer size (one frame plus room to detect oversize datagrams).
pub const DEFAULT_RECV_BUFFER_SIZE: usize = FRAME_SIZE + 1;

/// Async UDP socket wrapper for RUP.
#[derive(Debug, Clone)]
pub struct RupSocket {
    /// The underlying UDP socket.
    socket: Arc<UdpSocket>,
    /// Receive buffer size used by exchanges on this socket.
    recv_buffer_size: usize,
}

impl RupSocket {
    /// Create a new RUP socket bound to the given address.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::from_socket(socket))
    }

    /// Bind to `port` on every IPv4 interface.
    pub async fn bind_port(port: u16) -> io::Result<Self> {
        Self::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await
    }

    /// Create a RUP socket from an existing UDP socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket: Arc::new(socket),
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }

    /// Get a reference to the underlying socket.
    pub fn inner(&self) -> &UdpSocket {
        &self.socket
    }

    /// Close the socket.
    ///
    /// Clones of this handle keep the descriptor open until they are dropped.
    pub fn close(self) {
        drop(self);
    }
}

impl DatagramPort for RupSocket {
    async fn send_to(&self, datagram: &[u8], dest: SocketAddr) -> io::Result<()> {
        self.socket.send_to(datagram, dest).await?;
        Ok(())
    }

    async fn recv_from(
        &self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> io::Result<Option<(usize, SocketAddr)>> {
        match timeout {
            Some(window) => match tokio::time::timeout(window, self.socket.recv_from(buf)).await {
                Ok(received) => received.map(Some),
                Err(_elapsed) => Ok(None),
            },
            None => self.socket.recv_from(buf).await.map(Some),
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    fn recv_buffer_size(&self) -> usize {
        self.recv_buffer_size
    }
}

/// Builder for creating RUP sockets with custom options.
#[derive(Debug, Clone)]
pub struct RupSocketBuilder {
    recv_buffer_size: usize,
}

impl Default for RupSocketBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RupSocketBuilder {
    /// Create a new socket builder with default options.
    pub fn new() -> Self {
        Self {
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }

    /// Set the receive buffer size. Values that cannot hold one frame plus
    /// a byte are raised to [`DEFAULT_RECV_BUFFER_SIZE`].
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size.max(DEFAULT_RECV_BUFFER_SIZE);
        self
    }

    /// Bind to the given address and create a socket.
    pub async fn bind(self, addr: SocketAddr) -> io::Result<RupSocket> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(self.from_socket(socket))
    }

    /// Create a socket from an existing UDP socket.
    pub fn from_socket(self, socket: UdpSocket) -> RupSocket {
        RupSocket {
            socket: Arc::new(socket),
            recv_buffer_size: self.recv_buffer_size,
        }
    }
}
