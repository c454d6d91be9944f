//! Fault-injecting datagram port for deterministic tests.
//!
//! [`Simulator`] wraps any [`DatagramPort`] and applies a fault model to
//! outgoing datagrams:
//!
//! | Fault       | Description                                              |
//! |-------------|----------------------------------------------------------|
//! | Loss        | Drop a datagram with probability `loss_rate`.            |
//! | Corruption  | Flip one payload bit with probability `corrupt_rate`.    |
//! | Drop rule   | Drop every datagram a caller-supplied predicate selects. |
//!
//! The random faults come from a seeded [`StdRng`], so a failing run can be
//! replayed with the same seed.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use super::port::DatagramPort;
use crate::core::constants::{FRAME_SIZE, OFF_MARKER, OFF_PAYLOAD, PAYLOAD_SIZE};
use crate::frame::AckMarker;

/// Predicate selecting datagrams to drop.
pub type DropRule = Box<dyn Fn(&[u8]) -> bool + Send + Sync>;

/// Configuration for the fault model.
///
/// Probabilities are clamped to `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Probability that a datagram is silently dropped.
    pub loss_rate: f64,
    /// Probability that one payload bit is flipped.
    pub corrupt_rate: f64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corrupt_rate: 0.0,
            seed: 0,
        }
    }
}

impl SimulatorConfig {
    /// Set the loss probability.
    pub fn with_loss_rate(mut self, rate: f64) -> Self {
        self.loss_rate = rate;
        self
    }

    /// Set the corruption probability.
    pub fn with_corrupt_rate(mut self, rate: f64) -> Self {
        self.corrupt_rate = rate;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Counters of what the simulator did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatorStats {
    /// Datagrams handed to the wrapped port.
    pub forwarded: u64,
    /// Datagrams dropped by loss or a drop rule.
    pub dropped: u64,
    /// Forwarded datagrams that had a bit flipped.
    pub corrupted: u64,
}

enum Fault {
    Drop,
    Corrupt(usize, u8),
    Pass,
}

/// A [`DatagramPort`] that injects faults on send.
pub struct Simulator<P> {
    inner: P,
    config: SimulatorConfig,
    rng: Mutex<StdRng>,
    rule: Option<DropRule>,
    forwarded: AtomicU64,
    dropped: AtomicU64,
    corrupted: AtomicU64,
}

impl<P: DatagramPort> Simulator<P> {
    /// Wrap `inner` with the given fault model.
    pub fn new(inner: P, config: SimulatorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            inner,
            config,
            rng: Mutex::new(rng),
            rule: None,
            forwarded: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            corrupted: AtomicU64::new(0),
        }
    }

    /// Wrap `inner` without random faults.
    pub fn passthrough(inner: P) -> Self {
        Self::new(inner, SimulatorConfig::default())
    }

    /// Drop every outgoing datagram for which `rule` returns `true`.
    pub fn with_drop_rule(mut self, rule: impl Fn(&[u8]) -> bool + Send + Sync + 'static) -> Self {
        self.rule = Some(Box::new(rule));
        self
    }

    /// Drop every outgoing frame carrying `marker`.
    pub fn dropping_marker(self, marker: AckMarker) -> Self {
        self.with_drop_rule(move |datagram| {
            datagram.len() == FRAME_SIZE && datagram[OFF_MARKER] == marker.as_byte()
        })
    }

    /// The wrapped port.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Fault model in use.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Snapshot of the fault counters.
    pub fn stats(&self) -> SimulatorStats {
        SimulatorStats {
            forwarded: self.forwarded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            corrupted: self.corrupted.load(Ordering::Relaxed),
        }
    }

    fn decide(&self, datagram: &[u8]) -> Fault {
        if self.rule.as_ref().is_some_and(|rule| rule(datagram)) {
            return Fault::Drop;
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        if rng.gen_bool(self.config.loss_rate.clamp(0.0, 1.0)) {
            return Fault::Drop;
        }
        if datagram.len() == FRAME_SIZE && rng.gen_bool(self.config.corrupt_rate.clamp(0.0, 1.0)) {
            let index = OFF_PAYLOAD + rng.gen_range(0..PAYLOAD_SIZE);
            let bit = rng.gen_range(0..8u8);
            return Fault::Corrupt(index, bit);
        }
        Fault::Pass
    }
}

impl<P: DatagramPort> DatagramPort for Simulator<P> {
    async fn send_to(&self, datagram: &[u8], dest: SocketAddr) -> io::Result<()> {
        match self.decide(datagram) {
            Fault::Drop => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(%dest, "simulator dropped datagram");
                Ok(())
            }
            Fault::Corrupt(index, bit) => {
                let mut damaged = datagram.to_vec();
                damaged[index] ^= 1 << bit;
                self.corrupted.fetch_add(1, Ordering::Relaxed);
                self.forwarded.fetch_add(1, Ordering::Relaxed);
                trace!(%dest, index, bit, "simulator corrupted datagram");
                self.inner.send_to(&damaged, dest).await
            }
            Fault::Pass => {
                self.forwarded.fetch_add(1, Ordering::Relaxed);
                self.inner.send_to(datagram, dest).await
            }
        }
    }

    async fn recv_from(
        &self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> io::Result<Option<(usize, SocketAddr)>> {
        self.inner.recv_from(buf, timeout).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    fn recv_buffer_size(&self) -> usize {
        self.inner.recv_buffer_size()
    }
}

impl<P> fmt::Debug for Simulator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("config", &self.config)
            .field("has_rule", &self.rule.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RupSocket;

    async fn pair() -> (RupSocket, RupSocket) {
        let a = RupSocket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let b = RupSocket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        (a, b)
    }

    fn frame_with_marker(marker: AckMarker) -> Vec<u8> {
        let mut datagram = vec![0u8; FRAME_SIZE];
        datagram[OFF_MARKER] = marker.as_byte();
        datagram
    }

    #[tokio::test]
    async fn test_passthrough_forwards() {
        let (a, b) = pair().await;
        let sim = Simulator::passthrough(a);
        let dest = b.local_addr().unwrap();

        sim.send_to(b"ping", dest).await.unwrap();

        let mut buf = [0u8; 16];
        let (len, _) = b
            .recv_from(&mut buf, Some(Duration::from_secs(2)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..len], b"ping");
        assert_eq!(sim.stats().forwarded, 1);
        assert_eq!(sim.stats().dropped, 0);
    }

    #[tokio::test]
    async fn test_total_loss() {
        let (a, b) = pair().await;
        let sim = Simulator::new(a, SimulatorConfig::default().with_loss_rate(1.0));

        sim.send_to(b"lost", b.local_addr().unwrap()).await.unwrap();

        let mut buf = [0u8; 16];
        let received = b
            .recv_from(&mut buf, Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert!(received.is_none());
        assert_eq!(sim.stats().dropped, 1);
    }

    #[tokio::test]
    async fn test_marker_rule_is_selective() {
        let (a, b) = pair().await;
        let sim = Simulator::passthrough(a).dropping_marker(AckMarker::FinalAck);
        let dest = b.local_addr().unwrap();

        sim.send_to(&frame_with_marker(AckMarker::FinalAck), dest).await.unwrap();
        sim.send_to(&frame_with_marker(AckMarker::Ack), dest).await.unwrap();

        let mut buf = vec![0u8; FRAME_SIZE + 1];
        let (len, _) = b
            .recv_from(&mut buf, Some(Duration::from_secs(2)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(len, FRAME_SIZE);
        assert_eq!(buf[OFF_MARKER], AckMarker::Ack.as_byte());
        assert_eq!(sim.stats(), SimulatorStats { forwarded: 1, dropped: 1, corrupted: 0 });
    }

    #[tokio::test]
    async fn test_corruption_flips_one_payload_bit() {
        let (a, b) = pair().await;
        let sim = Simulator::new(a, SimulatorConfig::default().with_corrupt_rate(1.0).with_seed(7));

        let original = frame_with_marker(AckMarker::None);
        sim.send_to(&original, b.local_addr().unwrap()).await.unwrap();

        let mut buf = vec![0u8; FRAME_SIZE + 1];
        let (len, _) = b
            .recv_from(&mut buf, Some(Duration::from_secs(2)))
            .await
            .unwrap()
            .unwrap();
        let flipped: u32 = original
            .iter()
            .zip(&buf[..len])
            .map(|(x, y)| (x ^ y).count_ones())
            .sum();
        assert_eq!(flipped, 1);
        assert!(buf[..OFF_PAYLOAD] == original[..OFF_PAYLOAD]);
        assert_eq!(sim.stats().corrupted, 1);
    }

    #[tokio::test]
    async fn test_same_seed_same_faults() {
        let run = |seed| async move {
            let (a, b) = pair().await;
            let sim = Simulator::new(a, SimulatorConfig::default().with_loss_rate(0.5).with_seed(seed));
            for _ in 0..32 {
                sim.send_to(b"x", b.local_addr().unwrap()).await.unwrap();
            }
            sim.stats()
        };
        assert_eq!(run(11).await, run(11).await);
    }
}
