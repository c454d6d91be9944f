//! High-level RUP endpoint.
//!
//! [`RupEndpoint`] owns a datagram port, a [`ProtocolConfig`] and, when
//! enabled, the [`DeliveryLog`]. Each call runs one complete exchange.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::core::{ProtocolConfig, RupResult};
use crate::exchange::{Delivery, DeliveryLog, Receiver, SendOutcome, Sender};
use crate::frame::Frame;
use crate::transport::{DatagramPort, RupSocket};

/// A bound socket speaking RUP.
///
/// Exchanges on one endpoint must not overlap: run one `send` or `receive`
/// at a time.
#[derive(Debug)]
pub struct RupEndpoint<P = RupSocket> {
    port: P,
    config: ProtocolConfig,
    log: Option<DeliveryLog>,
}

impl RupEndpoint<RupSocket> {
    /// Bind a UDP socket to `addr` with the default policy.
    pub async fn bind(addr: SocketAddr) -> RupResult<Self> {
        Self::bind_with_config(addr, ProtocolConfig::default()).await
    }

    /// Bind a UDP socket to `addr` with `config`.
    pub async fn bind_with_config(addr: SocketAddr, config: ProtocolConfig) -> RupResult<Self> {
        config.validate()?;
        let socket = RupSocket::bind(addr).await?;
        Self::from_port(socket, config)
    }

    /// Bind to `port` on every IPv4 interface.
    pub async fn bind_port(port: u16) -> RupResult<Self> {
        Self::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await
    }
}

impl<P: DatagramPort> RupEndpoint<P> {
    /// Wrap an open port.
    pub fn from_port(port: P, config: ProtocolConfig) -> RupResult<Self> {
        config.validate()?;
        let log = config.delivery_log.map(DeliveryLog::new);
        Ok(Self { port, config, log })
    }

    /// Local address of the underlying port.
    pub fn local_addr(&self) -> RupResult<SocketAddr> {
        Ok(self.port.local_addr()?)
    }

    /// Policy in use.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// The underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// The delivery log, when enabled.
    pub fn delivery_log(&self) -> Option<&DeliveryLog> {
        self.log.as_ref()
    }

    /// Deliver a data frame to `dest`.
    pub async fn send(&self, frame: &Frame, dest: SocketAddr) -> RupResult<SendOutcome> {
        let mut sender = Sender::new(&self.port, &self.config);
        Ok(sender.send(frame, dest).await?)
    }

    /// Deliver `payload` as exchange `sequence_id` with empty identity
    /// fields.
    ///
    /// The frame's origin is this endpoint's IPv4 address, or unspecified
    /// when bound to IPv6.
    pub async fn send_message(
        &self,
        sequence_id: u32,
        payload: &[u8],
        dest: SocketAddr,
    ) -> RupResult<SendOutcome> {
        let frame = Frame::builder(sequence_id)
            .origin(self.origin()?)
            .payload(payload)
            .build()?;
        self.send(&frame, dest).await
    }

    /// Receive one message.
    pub async fn receive(&mut self) -> RupResult<Delivery> {
        let mut receiver = Receiver::new(&self.port, &self.config);
        if let Some(log) = self.log.as_mut() {
            receiver = receiver.with_delivery_log(log);
        }
        Ok(receiver.receive().await?)
    }

    /// Origin address to stamp into outgoing frames.
    pub fn origin(&self) -> RupResult<SocketAddrV4> {
        Ok(match self.port.local_addr()? {
            SocketAddr::V4(addr) => addr,
            SocketAddr::V6(_) => SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
        })
    }

    /// Close the endpoint, releasing the port.
    pub fn close(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DeliveryLogConfig, RetryLimit, RupError};
    use std::time::Duration;

    fn fast() -> ProtocolConfig {
        ProtocolConfig::new()
            .with_reply_timeout(Duration::from_millis(30))
            .with_handshake_limit(RetryLimit::Attempts(20))
    }

    #[tokio::test]
    async fn test_bind_and_origin() {
        let endpoint = RupEndpoint::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let local = endpoint.local_addr().unwrap();
        assert_eq!(SocketAddr::V4(endpoint.origin().unwrap()), local);
        assert!(endpoint.delivery_log().is_none());
        endpoint.close();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = ProtocolConfig::new().with_stop_attempts(0);
        let result = RupEndpoint::bind_with_config("127.0.0.1:0".parse().unwrap(), config).await;
        assert!(matches!(result, Err(RupError::Config(_))));
    }

    #[tokio::test]
    async fn test_oversized_payload_is_frame_error() {
        let endpoint = RupEndpoint::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let result = endpoint
            .send_message(1, &[7u8; 2000], "127.0.0.1:9".parse().unwrap())
            .await;
        assert!(matches!(result, Err(RupError::Frame(_))));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let mut server = RupEndpoint::bind_with_config("127.0.0.1:0".parse().unwrap(), fast())
            .await
            .unwrap();
        let client = RupEndpoint::bind_with_config("127.0.0.1:0".parse().unwrap(), fast())
            .await
            .unwrap();
        let server_addr = server.local_addr().unwrap();

        let (sent, received) = tokio::join!(
            client.send_message(42, b"HELLO", server_addr),
            server.receive()
        );

        let outcome = sent.unwrap();
        let delivery = received.unwrap();
        assert!(outcome.attempts.data >= 1);
        assert_eq!(delivery.frame.sequence_id(), 42);
        assert_eq!(delivery.frame.payload().as_bytes(), b"HELLO");
        assert_eq!(delivery.peer, client.local_addr().unwrap());
        assert_eq!(SocketAddr::V4(delivery.frame.origin()), client.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_delivery_log_enabled() {
        let config = fast().with_delivery_log(DeliveryLogConfig::default());
        let endpoint = RupEndpoint::bind_with_config("127.0.0.1:0".parse().unwrap(), config)
            .await
            .unwrap();
        assert!(endpoint.delivery_log().is_some_and(DeliveryLog::is_empty));
    }
}
