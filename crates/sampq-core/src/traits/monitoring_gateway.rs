// # Monitoring Gateway Trait
//
// Defines the interface for third-party REST services that scrape and
// republish server lists.
//
// ## Implementations
//
// - SAMonitor: `sampq-monitor-samonitor` crate
// - open.mp monitor: `sampq-monitor-openmp` crate
//
// ## Usage
//
// ```rust,ignore
// use sampq_core::{CancellationToken, GatewayResponse, MonitoringGateway};
//
// async fn print_servers(gateway: &dyn MonitoringGateway) -> sampq_core::Result<()> {
//     let token = CancellationToken::new();
//     match gateway.list_servers(&token).await? {
//         GatewayResponse::Data(servers) => println!("{} servers", servers.len()),
//         GatewayResponse::NoData => println!("provider unavailable"),
//         GatewayResponse::Unsupported => println!("listing not supported"),
//     }
//     Ok(())
// }
// ```

use crate::model::{PlayerRecord, ServerRecord};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Outcome of a gateway call
///
/// `NoData` and `Unsupported` are kept apart so callers never mistake
/// "this provider cannot answer" for "the server has zero players".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayResponse<T> {
    /// The provider answered
    Data(T),
    /// The provider failed (bad base URL, non-2xx, unreachable, malformed JSON)
    NoData,
    /// This gateway variant has no working endpoint for the operation
    Unsupported,
}

impl<T> GatewayResponse<T> {
    /// Convert into an `Option`, dropping the failure distinction
    pub fn data(self) -> Option<T> {
        match self {
            GatewayResponse::Data(value) => Some(value),
            GatewayResponse::NoData | GatewayResponse::Unsupported => None,
        }
    }

    /// Whether the provider answered
    pub fn is_data(&self) -> bool {
        matches!(self, GatewayResponse::Data(_))
    }

    /// Whether the operation is unsupported by this gateway
    pub fn is_unsupported(&self) -> bool {
        matches!(self, GatewayResponse::Unsupported)
    }

    /// Map the carried value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GatewayResponse<U> {
        match self {
            GatewayResponse::Data(value) => GatewayResponse::Data(f(value)),
            GatewayResponse::NoData => GatewayResponse::NoData,
            GatewayResponse::Unsupported => GatewayResponse::Unsupported,
        }
    }
}

/// Trait for monitoring gateway implementations
///
/// Each implementation wraps one REST provider's endpoints and JSON shape
/// and normalizes it into [`ServerRecord`] / [`PlayerRecord`].
///
/// # Failure Handling
///
/// Gateways consume untrusted third-party payloads. An unparsable base URL,
/// a non-2xx response, an unreachable host or malformed JSON must all be
/// reported as [`GatewayResponse::NoData`]. The only error a gateway
/// returns is `Error::Cancelled`.
///
/// # Statelessness
///
/// Gateways keep no state between calls beyond their HTTP client, and they
/// never retry. Provider schemas are unstable: unknown fields are ignored
/// and missing fields take defaults.
#[async_trait]
pub trait MonitoringGateway: Send + Sync {
    /// Fetch every server the provider knows about
    async fn list_servers(
        &self,
        token: &CancellationToken,
    ) -> crate::Result<GatewayResponse<Vec<ServerRecord>>>;

    /// Fetch one server's snapshot by address
    async fn get_server_info(
        &self,
        host: &str,
        port: u16,
        token: &CancellationToken,
    ) -> crate::Result<GatewayResponse<ServerRecord>>;

    /// Fetch one server's player list by address
    async fn get_server_players(
        &self,
        host: &str,
        port: u16,
        token: &CancellationToken,
    ) -> crate::Result<GatewayResponse<Vec<PlayerRecord>>>;

    /// Get the gateway name (for logging and selection)
    fn name(&self) -> &'static str;
}

/// Helper trait for constructing gateways from configuration
pub trait MonitoringGatewayFactory: Send + Sync {
    /// Create a gateway from its configuration
    ///
    /// # Returns
    ///
    /// A shared gateway trait object, or `Error::Config` when the
    /// configuration belongs to another gateway type
    fn create(
        &self,
        config: &crate::config::GatewayConfig,
    ) -> crate::Result<std::sync::Arc<dyn MonitoringGateway>>;
}
