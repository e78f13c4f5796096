// # open.mp Monitor Gateway
//
// This crate provides the open.mp monitoring gateway for sampq.
//
// ## Behaviour
//
// - Server list only; single-server info and player lists answer
//   `GatewayResponse::Unsupported`
// - One HTTP request per call, no retries, no caching
// - HTTP timeout configured (30 seconds)
// - Provider failures surface as `GatewayResponse::NoData`
//
// ## API Reference
//
// - List: GET `{base}/servers`

pub mod contract;

use async_trait::async_trait;
use reqwest::Url;
use sampq_core::config::GatewayConfig;
use sampq_core::traits::{GatewayResponse, MonitoringGateway, MonitoringGatewayFactory};
use sampq_core::{CancellationToken, Error, PlayerRecord, Result, ServerRecord};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// Registry name of this gateway
pub const GATEWAY_NAME: &str = "openmp";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const SERVERS_ENDPOINT: &str = "servers";

/// open.mp monitoring gateway
#[derive(Debug)]
pub struct OpenMpGateway {
    /// URL of the server list, `None` when the configured base did not parse
    servers_url: Option<Url>,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl OpenMpGateway {
    /// Create a gateway for the given API base URL
    pub fn new(base_url: &str) -> Self {
        let servers_url = Url::parse(base_url.trim())
            .and_then(|base| {
                Url::parse(&format!(
                    "{}/{}",
                    base.as_str().trim_end_matches('/'),
                    SERVERS_ENDPOINT
                ))
            })
            .inspect_err(|e| error!("Cannot parse open.mp base URL {:?}: {}", base_url, e))
            .ok();

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client ({}), using defaults", e);
                reqwest::Client::default()
            });

        Self {
            servers_url,
            client,
        }
    }

    /// URL the server list is fetched from
    pub fn servers_url(&self) -> Option<&Url> {
        self.servers_url.as_ref()
    }

    async fn fetch_servers(&self, url: &Url, token: &CancellationToken) -> Result<Option<Value>> {
        debug!("GET {}", url);

        let response = tokio::select! {
            biased;
            () = token.cancelled() => return Err(Error::Cancelled),
            result = self.client.get(url.clone()).send() => result,
        };
        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!("open.mp monitor returned {} for {}", response.status(), url);
                return Ok(None);
            }
            Err(e) => {
                warn!("open.mp monitor request to {} failed: {}", url, e);
                return Ok(None);
            }
        };

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
impl MonitoringGateway for OpenMpGateway {
    async fn list_servers(
        &self,
        token: &CancellationToken,
    ) -> Result<GatewayResponse<Vec<ServerRecord>>> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let Some(url) = &self.servers_url else {
            return Ok(GatewayResponse::NoData);
        };

        match self.fetch_servers(url, token).await? {
            Some(Value::Array(entries)) => {
                let servers = contract::parse_servers(entries);
                trace!("open.mp server list accepted ({} servers)", servers.len());
                Ok(GatewayResponse::Data(servers))
            }
            Some(_) => {
                warn!("open.mp server list is not an array");
                Ok(GatewayResponse::NoData)
            }
            None => Ok(GatewayResponse::NoData),
        }
    }

    async fn get_server_info(
        &self,
        _host: &str,
        _port: u16,
        token: &CancellationToken,
    ) -> Result<GatewayResponse<ServerRecord>> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(GatewayResponse::Unsupported)
    }

    async fn get_server_players(
        &self,
        _host: &str,
        _port: u16,
        token: &CancellationToken,
    ) -> Result<GatewayResponse<Vec<PlayerRecord>>> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(GatewayResponse::Unsupported)
    }

    fn name(&self) -> &'static str {
        GATEWAY_NAME
    }
}

/// Factory for creating open.mp gateways
pub struct OpenMpFactory;

impl MonitoringGatewayFactory for OpenMpFactory {
    fn create(&self, config: &GatewayConfig) -> Result<Arc<dyn MonitoringGateway>> {
        match config {
            GatewayConfig::OpenMp { base_url } => Ok(Arc::new(OpenMpGateway::new(base_url))),
            _ => Err(Error::config("Invalid config for open.mp gateway")),
        }
    }
}

/// Register the open.mp gateway with a registry
///
/// # Example
///
/// ```rust
/// use sampq_core::GatewayRegistry;
///
/// let registry = GatewayRegistry::new();
/// sampq_monitor_openmp::register(&registry);
/// assert!(registry.has_gateway("openmp"));
/// ```
pub fn register(registry: &sampq_core::GatewayRegistry) {
    registry.register_gateway(GATEWAY_NAME, Box::new(OpenMpFactory));
}
