//! Server list orchestration
//!
//! The ServerListService is responsible for:
//! - Validating addresses before any I/O happens
//! - Routing bulk listing to the selected monitoring gateway
//! - Routing single-server detail and players to the live query path
//! - Swapping the selected gateway at runtime
//!
//! ## Architecture
//!
//! ```text
//!                      ┌───────────────────┐
//!   caller ──────────▶ │ ServerListService │
//!                      └───────────────────┘
//!                         │             │
//!            list_servers │             │ get_server_info / players / full
//!                         ▼             ▼
//!             ┌───────────────────┐  ┌─────────────┐
//!             │ MonitoringGateway │  │ ServerQuery │
//!             │ (ArcSwap)         │  │ (live UDP)  │
//!             └───────────────────┘  └─────────────┘
//! ```
//!
//! ## Failure Policy
//!
//! Live data always wins over monitoring snapshots for a single server.
//! When a live query fails the service logs the cause and returns
//! `Ok(None)`; it never fabricates a record. Cancellation is the only
//! error that escapes, so callers can tell "user cancelled" from "server
//! unreachable". Substituting the unknown sentinel is the caller's choice
//! ([`ServerListService::get_server_info_or_unknown`]).

use crate::config::{PortPolicy, SampqConfig};
use crate::error::{Error, Result};
use crate::model::{DEFAULT_PORT, PlayerRecord, ServerAddress, ServerRecord};
use crate::traits::{GatewayResponse, MonitoringGateway, ServerQuery};
use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Orchestration facade over the monitoring gateway and the live query path
///
/// ## Threading
///
/// The service is `Send + Sync` and is meant to be shared behind an `Arc`.
/// The selected gateway is held in an [`ArcSwap`]: a call that reads it
/// during [`set_gateway`](Self::set_gateway) observes either the old or the
/// new gateway, and in-flight calls keep the instance they started with.
pub struct ServerListService {
    /// Currently selected monitoring gateway
    gateway: ArcSwap<Arc<dyn MonitoringGateway>>,

    /// Live query implementation
    query: Arc<dyn ServerQuery>,

    /// Accepted port window
    ports: PortPolicy,

    /// Port assumed for bare hosts
    default_port: u16,
}

impl ServerListService {
    /// Create a service with the default port policy
    pub fn new(gateway: Arc<dyn MonitoringGateway>, query: Arc<dyn ServerQuery>) -> Self {
        Self {
            gateway: ArcSwap::from_pointee(gateway),
            query,
            ports: PortPolicy::default(),
            default_port: DEFAULT_PORT,
        }
    }

    /// Create a service using the port policy and default port from `config`
    pub fn from_config(
        gateway: Arc<dyn MonitoringGateway>,
        query: Arc<dyn ServerQuery>,
        config: &SampqConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(gateway, query)
            .with_port_policy(config.ports)
            .with_default_port(config.query.default_port))
    }

    /// Replace the accepted port window
    pub fn with_port_policy(mut self, ports: PortPolicy) -> Self {
        self.ports = ports;
        self
    }

    /// Replace the port assumed for bare hosts
    pub fn with_default_port(mut self, default_port: u16) -> Self {
        self.default_port = default_port;
        self
    }

    /// Atomically swap the selected monitoring gateway
    pub fn set_gateway(&self, gateway: Arc<dyn MonitoringGateway>) {
        let previous = self.gateway.swap(Arc::new(gateway));
        info!(
            "Monitoring gateway switched: {} -> {}",
            previous.name(),
            self.gateway_name()
        );
    }

    /// Name of the selected gateway
    pub fn gateway_name(&self) -> &'static str {
        self.gateway.load().name()
    }

    /// Accepted port window
    pub fn port_policy(&self) -> PortPolicy {
        self.ports
    }

    fn current_gateway(&self) -> Arc<dyn MonitoringGateway> {
        Arc::clone(&**self.gateway.load())
    }

    /// List every server known to the selected gateway
    pub async fn list_servers(
        &self,
        token: &CancellationToken,
    ) -> Result<GatewayResponse<Vec<ServerRecord>>> {
        ensure_active(token)?;
        let gateway = self.current_gateway();
        let response = gateway.list_servers(token).await?;
        if let GatewayResponse::Data(servers) = &response {
            debug!("{} listed {} servers", gateway.name(), servers.len());
        }
        Ok(response)
    }

    /// Live basic information for one server, with measured ping
    ///
    /// Returns `Ok(None)` for invalid input and for failed queries.
    pub async fn get_server_info(
        &self,
        host: &str,
        port: u16,
        token: &CancellationToken,
    ) -> Result<Option<ServerRecord>> {
        ensure_active(token)?;
        let Some(address) = self.validate(host, port) else {
            return Ok(None);
        };
        let target = address.to_string();
        let result = self.query.get_info_with_ping(&target, token).await;
        recover(&target, result)
    }

    /// [`get_server_info`](Self::get_server_info) for a `host[:port]` string
    pub async fn get_server_info_at(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> Result<Option<ServerRecord>> {
        match self.parse(host_port) {
            Some(address) => {
                self.get_server_info(address.host(), address.port(), token)
                    .await
            }
            None => Ok(None),
        }
    }

    /// Live basic information, or the unknown sentinel when none is obtainable
    pub async fn get_server_info_or_unknown(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> Result<ServerRecord> {
        let record = self.get_server_info_at(host_port, token).await?;
        Ok(record.unwrap_or_else(|| self.unknown(host_port)))
    }

    /// Live info, rules and players merged into one record
    pub async fn get_full_server_info(
        &self,
        host: &str,
        port: u16,
        token: &CancellationToken,
    ) -> Result<Option<ServerRecord>> {
        ensure_active(token)?;
        let Some(address) = self.validate(host, port) else {
            return Ok(None);
        };
        let target = address.to_string();
        let result = self.query.get_full_info(&target, token).await;
        recover(&target, result)
    }

    /// [`get_full_server_info`](Self::get_full_server_info) for a `host[:port]` string
    pub async fn get_full_server_info_at(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> Result<Option<ServerRecord>> {
        match self.parse(host_port) {
            Some(address) => {
                self.get_full_server_info(address.host(), address.port(), token)
                    .await
            }
            None => Ok(None),
        }
    }

    /// Live player list for one server
    pub async fn get_server_players(
        &self,
        host: &str,
        port: u16,
        token: &CancellationToken,
    ) -> Result<Option<Vec<PlayerRecord>>> {
        ensure_active(token)?;
        let Some(address) = self.validate(host, port) else {
            return Ok(None);
        };
        let target = address.to_string();
        let result = self.query.get_players(&target, token).await;
        recover(&target, result)
    }

    /// [`get_server_players`](Self::get_server_players) for a `host[:port]` string
    pub async fn get_server_players_at(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> Result<Option<Vec<PlayerRecord>>> {
        match self.parse(host_port) {
            Some(address) => {
                self.get_server_players(address.host(), address.port(), token)
                    .await
            }
            None => Ok(None),
        }
    }

    /// Best-effort open.mp detection for one server
    pub async fn is_open_mp(
        &self,
        host: &str,
        port: u16,
        token: &CancellationToken,
    ) -> Result<Option<bool>> {
        ensure_active(token)?;
        let Some(address) = self.validate(host, port) else {
            return Ok(None);
        };
        let target = address.to_string();
        let result = self.query.is_open_mp(&target, token).await;
        recover(&target, result)
    }

    /// Snapshot of one server from the selected gateway
    ///
    /// Invalid input yields `NoData` without contacting the gateway.
    pub async fn get_monitored_server_info(
        &self,
        host: &str,
        port: u16,
        token: &CancellationToken,
    ) -> Result<GatewayResponse<ServerRecord>> {
        ensure_active(token)?;
        let Some(address) = self.validate(host, port) else {
            return Ok(GatewayResponse::NoData);
        };
        self.current_gateway()
            .get_server_info(address.host(), address.port(), token)
            .await
    }

    /// Player list of one server from the selected gateway
    pub async fn get_monitored_players(
        &self,
        host: &str,
        port: u16,
        token: &CancellationToken,
    ) -> Result<GatewayResponse<Vec<PlayerRecord>>> {
        ensure_active(token)?;
        let Some(address) = self.validate(host, port) else {
            return Ok(GatewayResponse::NoData);
        };
        self.current_gateway()
            .get_server_players(address.host(), address.port(), token)
            .await
    }

    /// Query many addresses concurrently
    ///
    /// One task is spawned per address. Records arrive in completion order;
    /// an address that cannot be validated or queried yields the unknown
    /// sentinel. Once `token` fires, pending queries are abandoned and the
    /// stream ends without yielding them.
    pub fn refresh(
        &self,
        addresses: Vec<String>,
        token: &CancellationToken,
    ) -> UnboundedReceiverStream<ServerRecord> {
        let (tx, rx) = mpsc::unbounded_channel();

        for host_port in addresses {
            let tx = tx.clone();
            let token = token.child_token();
            let query = Arc::clone(&self.query);
            let address = self.parse(&host_port);
            let unknown = self.unknown(&host_port);

            tokio::spawn(async move {
                let Some(address) = address else {
                    let _ = tx.send(unknown);
                    return;
                };
                let target = address.to_string();
                match query.get_info_with_ping(&target, &token).await {
                    Ok(record) => {
                        let _ = tx.send(record);
                    }
                    Err(Error::Cancelled) => {
                        debug!("Refresh of {} cancelled", target);
                    }
                    Err(e) => {
                        debug!("Refresh of {} failed: {}", target, e);
                        let _ = tx.send(unknown);
                    }
                }
            });
        }

        UnboundedReceiverStream::new(rx)
    }

    /// Validate components against the host rules and the port window
    fn validate(&self, host: &str, port: u16) -> Option<ServerAddress> {
        if !self.ports.contains(port) {
            debug!(
                "Rejected {}:{}: port outside {}..={}",
                host, port, self.ports.min_port, self.ports.max_port
            );
            return None;
        }
        match ServerAddress::new(host, port) {
            Ok(address) => Some(address),
            Err(e) => {
                debug!("Rejected {}:{}: {}", host, port, e);
                None
            }
        }
    }

    /// Parse and validate a `host[:port]` string
    fn parse(&self, host_port: &str) -> Option<ServerAddress> {
        match ServerAddress::parse_with_default(host_port, self.default_port) {
            Ok(address) => self.validate(address.host(), address.port()),
            Err(e) => {
                debug!("Rejected {:?}: {}", host_port, e);
                None
            }
        }
    }

    /// Unknown sentinel keyed by the canonical address when one parses
    fn unknown(&self, host_port: &str) -> ServerRecord {
        match ServerAddress::parse_with_default(host_port, self.default_port) {
            Ok(address) => ServerRecord::unknown(address.to_string()),
            Err(_) => ServerRecord::unknown(host_port.trim()),
        }
    }
}

fn ensure_active(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// Turn a live query failure into an absent result, keeping cancellation
fn recover<T>(target: &str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::Cancelled) => Err(Error::Cancelled),
        Err(e) => {
            warn!("Query to {} failed: {}", target, e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recover_keeps_cancellation() {
        let cancelled: Result<u8> = Err(Error::Cancelled);
        assert!(matches!(recover("a:1", cancelled), Err(Error::Cancelled)));

        let timed_out: Result<u8> = Err(Error::timeout("a:1", 1000));
        assert!(matches!(recover("a:1", timed_out), Ok(None)));

        assert!(matches!(recover("a:1", Ok(7u8)), Ok(Some(7))));
    }

    #[test]
    fn test_ensure_active() {
        let token = CancellationToken::new();
        assert!(ensure_active(&token).is_ok());
        token.cancel();
        assert!(matches!(ensure_active(&token), Err(Error::Cancelled)));
    }
}
