// # SAMonitor Gateway
//
// This crate provides the SAMonitor monitoring gateway for sampq.
//
// ## Behaviour
//
// - One HTTP request per call, no retries, no caching
// - HTTP timeout configured (30 seconds)
// - Unparsable base URL, non-2xx status, transport failure and malformed
//   JSON all surface as `GatewayResponse::NoData`
// - Cancellation is raced against the request and the body read
//
// ## API Reference
//
// - List: GET `{base}/GetAllServers`
// - By address: GET `{base}/GetServerByIP?ip_addr=host:port`
// - Players: GET `{base}/GetServerPlayers?ip_addr=host:port` (deprecated
//   upstream; failures are reported as no data)

pub mod contract;

use async_trait::async_trait;
use reqwest::Url;
use sampq_core::config::GatewayConfig;
use sampq_core::traits::{GatewayResponse, MonitoringGateway, MonitoringGatewayFactory};
use sampq_core::{CancellationToken, Error, PlayerRecord, Result, ServerRecord};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Registry name of this gateway
pub const GATEWAY_NAME: &str = "samonitor";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const LIST_ENDPOINT: &str = "GetAllServers";
const SERVER_ENDPOINT: &str = "GetServerByIP";
const PLAYERS_ENDPOINT: &str = "GetServerPlayers";

/// SAMonitor monitoring gateway
///
/// Stateless apart from the HTTP client. A gateway built from an
/// unparsable base URL is still usable; every call answers `NoData`.
#[derive(Debug)]
pub struct SaMonitorGateway {
    /// API base, `None` when the configured URL did not parse
    base_url: Option<Url>,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl SaMonitorGateway {
    /// Create a gateway for the given API base URL
    pub fn new(base_url: &str) -> Self {
        let parsed = Url::parse(base_url.trim());
        if let Err(e) = &parsed {
            error!("Cannot parse SAMonitor base URL {:?}: {}", base_url, e);
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client ({}), using defaults", e);
                reqwest::Client::default()
            });

        Self {
            base_url: parsed.ok(),
            client,
        }
    }

    /// Parsed API base, if any
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Build `{base}/{endpoint}` with an optional `ip_addr` query
    fn endpoint(&self, endpoint: &str, ip_addr: Option<&str>) -> Option<Url> {
        let base = self.base_url.as_ref()?;
        let mut url =
            Url::parse(&format!("{}/{}", base.as_str().trim_end_matches('/'), endpoint)).ok()?;
        if let Some(ip_addr) = ip_addr {
            url.query_pairs_mut().append_pair("ip_addr", ip_addr);
        }
        Some(url)
    }

    /// GET `url` and parse the body as JSON
    ///
    /// `Ok(None)` on any provider failure, `Err` only on cancellation.
    async fn fetch(&self, url: Url, token: &CancellationToken) -> Result<Option<Value>> {
        debug!("GET {}", url);

        let response = tokio::select! {
            biased;
            () = token.cancelled() => return Err(Error::Cancelled),
            result = self.client.get(url.clone()).send() => result,
        };
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("SAMonitor request to {} failed: {}", url, e);
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("SAMonitor returned {} for {}", status, url);
            return Ok(None);
        }

        let body = tokio::select! {
            biased;
            () = token.cancelled() => return Err(Error::Cancelled),
            result = response.json::<Value>() => result,
        };
        match body {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Malformed JSON from {}: {}", url, e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl MonitoringGateway for SaMonitorGateway {
    async fn list_servers(
        &self,
        token: &CancellationToken,
    ) -> Result<GatewayResponse<Vec<ServerRecord>>> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let Some(url) = self.endpoint(LIST_ENDPOINT, None) else {
            return Ok(GatewayResponse::NoData);
        };
        match self.fetch(url, token).await? {
            Some(Value::Array(entries)) => Ok(GatewayResponse::Data(contract::parse_servers(entries))),
            Some(other) => {
                warn!("SAMonitor server list is not an array ({})", json_kind(&other));
                Ok(GatewayResponse::NoData)
            }
            None => Ok(GatewayResponse::NoData),
        }
    }

    async fn get_server_info(
        &self,
        host: &str,
        port: u16,
        token: &CancellationToken,
    ) -> Result<GatewayResponse<ServerRecord>> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let ip_addr = format!("{host}:{port}");
        let Some(url) = self.endpoint(SERVER_ENDPOINT, Some(&ip_addr)) else {
            return Ok(GatewayResponse::NoData);
        };
        let Some(body) = self.fetch(url, token).await? else {
            return Ok(GatewayResponse::NoData);
        };

        let record = serde_json::from_value::<contract::SaMonitorServer>(body)
            .ok()
            .and_then(contract::SaMonitorServer::into_record);
        match record {
            Some(record) => Ok(GatewayResponse::Data(record)),
            None => {
                warn!("SAMonitor has no usable entry for {}", ip_addr);
                Ok(GatewayResponse::NoData)
            }
        }
    }

    async fn get_server_players(
        &self,
        host: &str,
        port: u16,
        token: &CancellationToken,
    ) -> Result<GatewayResponse<Vec<PlayerRecord>>> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let ip_addr = format!("{host}:{port}");
        let Some(url) = self.endpoint(PLAYERS_ENDPOINT, Some(&ip_addr)) else {
            return Ok(GatewayResponse::NoData);
        };
        let players = self
            .fetch(url, token)
            .await?
            .and_then(contract::parse_players);
        Ok(match players {
            Some(players) => GatewayResponse::Data(players),
            None => GatewayResponse::NoData,
        })
    }

    fn name(&self) -> &'static str {
        GATEWAY_NAME
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Factory for creating SAMonitor gateways
pub struct SaMonitorFactory;

impl MonitoringGatewayFactory for SaMonitorFactory {
    fn create(&self, config: &GatewayConfig) -> Result<Arc<dyn MonitoringGateway>> {
        match config {
            GatewayConfig::SaMonitor { base_url } => Ok(Arc::new(SaMonitorGateway::new(base_url))),
            _ => Err(Error::config("Invalid config for SAMonitor gateway")),
        }
    }
}

/// Register the SAMonitor gateway with a registry
///
/// # Example
///
/// ```rust
/// use sampq_core::GatewayRegistry;
///
/// let registry = GatewayRegistry::new();
/// sampq_monitor_samonitor::register(&registry);
/// assert!(registry.has_gateway("samonitor"));
/// ```
pub fn register(registry: &sampq_core::GatewayRegistry) {
    registry.register_gateway(GATEWAY_NAME, Box::new(SaMonitorFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creation() {
        let factory = SaMonitorFactory;
        let gateway = factory.create(&GatewayConfig::sa_monitor()).unwrap();
        assert_eq!(gateway.name(), "samonitor");
    }

    #[test]
    fn test_factory_rejects_other_config() {
        let factory = SaMonitorFactory;
        assert!(factory.create(&GatewayConfig::open_mp()).is_err());
    }

    #[test]
    fn test_endpoint_urls() {
        let gateway = SaMonitorGateway::new("https://sam.markski.ar/api/");
        let list = gateway.endpoint(LIST_ENDPOINT, None).unwrap();
        assert_eq!(list.as_str(), "https://sam.markski.ar/api/GetAllServers");

        let by_ip = gateway
            .endpoint(SERVER_ENDPOINT, Some("1.2.3.4:7777"))
            .unwrap();
        assert_eq!(
            by_ip.as_str(),
            "https://sam.markski.ar/api/GetServerByIP?ip_addr=1.2.3.4%3A7777"
        );
    }

    #[tokio::test]
    async fn test_unparsable_base_url_yields_no_data() {
        let gateway = SaMonitorGateway::new("not a url");
        assert!(gateway.base_url().is_none());

        let token = CancellationToken::new();
        assert_eq!(
            gateway.list_servers(&token).await.unwrap(),
            GatewayResponse::NoData
        );
        assert_eq!(
            gateway
                .get_server_info("1.2.3.4", 7777, &token)
                .await
                .unwrap(),
            GatewayResponse::NoData
        );
        assert_eq!(
            gateway
                .get_server_players("1.2.3.4", 7777, &token)
                .await
                .unwrap(),
            GatewayResponse::NoData
        );
    }
}
