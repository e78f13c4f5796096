//! UDP request/response transport
//!
//! One exchange = one ephemeral unconnected socket, one send, one receive.
//! The socket is dropped on every exit path (reply, timeout, cancellation,
//! error). No retries happen here.

use async_trait::async_trait;
use sampq_core::config::QueryConfig;
use sampq_core::{CancellationToken, Error, Result};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tracing::{debug, trace};

/// Receive buffer size: the largest UDP payload, so no reply is truncated
///
/// Detailed player lists of crowded servers run well past 4 KiB.
pub const RECEIVE_BUFFER_SIZE: usize = 65_535;

/// Default receive deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// One completed request/response exchange
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Raw reply datagram
    pub datagram: Vec<u8>,
    /// Time from send to receive
    pub elapsed: Duration,
}

impl Exchange {
    /// Round-trip time in whole milliseconds
    pub fn rtt_ms(&self) -> u32 {
        u32::try_from(self.elapsed.as_millis()).unwrap_or(u32::MAX)
    }
}

/// Trait for sending one query datagram and awaiting one reply
///
/// The adapter is generic over this seam so the protocol logic can be
/// exercised against scripted replies.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Send `request` to `target` and return the first reply from it
    ///
    /// # Errors
    ///
    /// - `Error::Timeout` if no reply arrives before the deadline
    /// - `Error::Cancelled` if `token` fires first
    /// - `Error::Network` on socket failures
    async fn exchange(
        &self,
        target: SocketAddrV4,
        request: &[u8],
        token: &CancellationToken,
    ) -> Result<Exchange>;

    /// Resolve a host to an IPv4 address
    async fn resolve(&self, host: &str, token: &CancellationToken) -> Result<Ipv4Addr> {
        resolve_ipv4(host, token).await
    }
}

/// Resolve `host` to an IPv4 address
///
/// IPv4 literals are used directly; otherwise the first IPv4 result of a
/// DNS lookup wins.
pub async fn resolve_ipv4(host: &str, token: &CancellationToken) -> Result<Ipv4Addr> {
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(ip);
    }

    let addrs = tokio::select! {
        biased;
        () = token.cancelled() => return Err(Error::Cancelled),
        result = tokio::net::lookup_host((host, 0)) => {
            result.map_err(|e| Error::resolve(format!("{host}: {e}")))?
        }
    };

    addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| Error::resolve(format!("{host} has no IPv4 address")))
}

/// Production transport over `tokio::net::UdpSocket`
#[derive(Debug, Clone)]
pub struct UdpTransport {
    timeout: Duration,
}

impl UdpTransport {
    /// Create a transport with the given receive deadline
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Create a transport from query settings
    pub fn from_config(config: &QueryConfig) -> Self {
        Self::new(config.timeout())
    }

    /// Receive deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl QueryTransport for UdpTransport {
    async fn exchange(
        &self,
        target: SocketAddrV4,
        request: &[u8],
        token: &CancellationToken,
    ) -> Result<Exchange> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        let started = Instant::now();
        socket.send_to(request, target).await?;
        trace!("Sent {} bytes to {}", request.len(), target);

        let mut buffer = vec![0u8; RECEIVE_BUFFER_SIZE];
        let receive = async {
            loop {
                let (len, from) = socket.recv_from(&mut buffer).await?;
                if from == SocketAddr::V4(target) {
                    return Ok::<usize, std::io::Error>(len);
                }
                debug!("Ignoring {} bytes from {} (expected {})", len, from, target);
            }
        };

        let len = tokio::select! {
            biased;
            () = token.cancelled() => return Err(Error::Cancelled),
            result = tokio::time::timeout(self.timeout, receive) => match result {
                Ok(received) => received?,
                Err(_) => {
                    let after_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                    return Err(Error::timeout(target, after_ms));
                }
            },
        };

        let elapsed = started.elapsed();
        buffer.truncate(len);
        trace!("Received {} bytes from {} in {:?}", len, target, elapsed);

        Ok(Exchange {
            datagram: buffer,
            elapsed,
        })
    }
}
