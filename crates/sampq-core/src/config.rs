//! Configuration types
//!
//! This module defines the configuration consumed by the core and by the
//! gateway factories. Loading it (environment, files) is the embedder's job.

use serde::{Deserialize, Serialize};

/// Default SAMonitor API base URL
pub const DEFAULT_SAMONITOR_URL: &str = "https://sam.markski.ar/api";

/// Default open.mp monitoring API base URL
pub const DEFAULT_OPENMP_URL: &str = "https://api.open.mp/";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampqConfig {
    /// Monitoring gateways available for selection
    pub gateways: Vec<GatewayConfig>,

    /// Type name of the gateway selected at startup
    #[serde(default = "default_active_gateway")]
    pub active_gateway: String,

    /// Live query settings
    #[serde(default)]
    pub query: QueryConfig,

    /// Accepted port window for single-server requests
    #[serde(default)]
    pub ports: PortPolicy,
}

impl SampqConfig {
    /// Create a configuration with both built-in gateways at their default URLs
    pub fn new() -> Self {
        Self {
            gateways: vec![GatewayConfig::sa_monitor(), GatewayConfig::open_mp()],
            active_gateway: default_active_gateway(),
            query: QueryConfig::default(),
            ports: PortPolicy::default(),
        }
    }

    /// Find the configuration of the gateway selected at startup
    pub fn active(&self) -> Option<&GatewayConfig> {
        self.gateways
            .iter()
            .find(|g| g.type_name() == self.active_gateway)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.gateways.is_empty() {
            return Err(crate::Error::config("No monitoring gateways configured"));
        }

        for gateway in &self.gateways {
            gateway.validate()?;
        }

        if self.active().is_none() {
            return Err(crate::Error::config(format!(
                "Active gateway '{}' is not configured",
                self.active_gateway
            )));
        }

        self.query.validate()?;
        self.ports.validate()?;

        Ok(())
    }
}

impl Default for SampqConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_active_gateway() -> String {
    "samonitor".to_string()
}

/// Monitoring gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayConfig {
    /// SAMonitor REST API
    #[serde(rename = "samonitor")]
    SaMonitor {
        /// API base URL (e.g. "https://sam.markski.ar/api")
        base_url: String,
    },

    /// open.mp monitoring REST API
    #[serde(rename = "openmp")]
    OpenMp {
        /// API base URL (e.g. "https://api.open.mp/")
        base_url: String,
    },

    /// Custom gateway
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl GatewayConfig {
    /// SAMonitor at its default URL
    pub fn sa_monitor() -> Self {
        GatewayConfig::SaMonitor {
            base_url: DEFAULT_SAMONITOR_URL.to_string(),
        }
    }

    /// open.mp monitor at its default URL
    pub fn open_mp() -> Self {
        GatewayConfig::OpenMp {
            base_url: DEFAULT_OPENMP_URL.to_string(),
        }
    }

    /// Validate the gateway configuration
    ///
    /// A base URL that does not parse is *not* a validation error: the
    /// gateway is still created and answers every call with no data.
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            GatewayConfig::SaMonitor { .. } | GatewayConfig::OpenMp { .. } => Ok(()),
            GatewayConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom gateway factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom gateway config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the gateway type name
    pub fn type_name(&self) -> &str {
        match self {
            GatewayConfig::SaMonitor { .. } => "samonitor",
            GatewayConfig::OpenMp { .. } => "openmp",
            GatewayConfig::Custom { factory, .. } => factory,
        }
    }

    /// Base URL for the built-in variants
    pub fn base_url(&self) -> Option<&str> {
        match self {
            GatewayConfig::SaMonitor { base_url } | GatewayConfig::OpenMp { base_url } => {
                Some(base_url)
            }
            GatewayConfig::Custom { .. } => None,
        }
    }
}

/// Live query settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Receive deadline per UDP exchange (in milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Port used when an address carries no port
    #[serde(default = "default_port")]
    pub default_port: u16,

    /// Servers reporting more players than this skip the player list query
    #[serde(default = "default_player_list_limit")]
    pub player_list_limit: u32,
}

impl QueryConfig {
    /// Validate the query settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.timeout_ms == 0 {
            return Err(crate::Error::config("Query timeout must be > 0"));
        }
        if self.default_port == 0 {
            return Err(crate::Error::config("Default port must be > 0"));
        }
        Ok(())
    }

    /// Receive deadline as a `Duration`
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            default_port: default_port(),
            player_list_limit: default_player_list_limit(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_port() -> u16 {
    crate::model::DEFAULT_PORT
}

fn default_player_list_limit() -> u32 {
    70
}

/// Accepted port window for single-server requests
///
/// This is policy, not protocol: real servers listen well above 9999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortPolicy {
    /// Lowest accepted port (inclusive)
    pub min_port: u16,
    /// Highest accepted port (inclusive)
    pub max_port: u16,
}

impl PortPolicy {
    /// The historical 1000..=9999 window
    pub fn strict() -> Self {
        Self {
            min_port: 1000,
            max_port: 9999,
        }
    }

    /// Whether `port` falls inside the window
    pub fn contains(&self, port: u16) -> bool {
        (self.min_port..=self.max_port).contains(&port)
    }

    /// Validate the window bounds
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.min_port == 0 || self.min_port > self.max_port {
            return Err(crate::Error::config(format!(
                "Invalid port window {}..={}",
                self.min_port, self.max_port
            )));
        }
        Ok(())
    }
}

impl Default for PortPolicy {
    fn default() -> Self {
        Self {
            min_port: 1000,
            max_port: u16::MAX,
        }
    }
}
