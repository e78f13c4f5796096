//! Plugin-based gateway registry
//!
//! The registry allows monitoring gateways to be registered dynamically at
//! runtime, so the daemon selects a provider by name instead of by
//! hardcoded branches.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sampq_core::registry::GatewayRegistry;
//! use sampq_core::config::GatewayConfig;
//!
//! let registry = GatewayRegistry::new();
//! sampq_monitor_samonitor::register(&registry);
//!
//! let gateway = registry.create_gateway(&GatewayConfig::sa_monitor())?;
//! ```
//!
//! ## Registration
//!
//! Gateway crates expose a `register` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &GatewayRegistry) {
//!     registry.register_gateway("samonitor", Box::new(SaMonitorFactory));
//! }
//! ```

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::traits::{MonitoringGateway, MonitoringGatewayFactory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Gateway registry for plugin-based monitoring gateway creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes. A poisoned lock is recovered; the map is
/// never left half-written by a registration.
#[derive(Default)]
pub struct GatewayRegistry {
    /// Registered gateway factories
    gateways: RwLock<HashMap<String, Box<dyn MonitoringGatewayFactory>>>,
}

impl GatewayRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gateway factory
    ///
    /// # Parameters
    ///
    /// - `name`: Gateway type name (e.g., "samonitor", "openmp")
    /// - `factory`: Factory object for creating gateway instances
    pub fn register_gateway(
        &self,
        name: impl Into<String>,
        factory: Box<dyn MonitoringGatewayFactory>,
    ) {
        let name = name.into();
        let mut gateways = self
            .gateways
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        gateways.insert(name, factory);
    }

    /// Create a gateway from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn MonitoringGateway>)`: Created gateway instance
    /// - `Err(Error)`: If the gateway type is not registered or creation fails
    pub fn create_gateway(&self, config: &GatewayConfig) -> Result<Arc<dyn MonitoringGateway>> {
        let gateway_type = config.type_name();
        let gateways = self.gateways.read().unwrap_or_else(PoisonError::into_inner);

        let factory = gateways
            .get(gateway_type)
            .ok_or_else(|| Error::config(format!("Unknown gateway type: {}", gateway_type)))?;

        factory.create(config)
    }

    /// List all registered gateway types, sorted by name
    pub fn list_gateways(&self) -> Vec<String> {
        let gateways = self.gateways.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = gateways.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a gateway type is registered
    pub fn has_gateway(&self, name: &str) -> bool {
        let gateways = self.gateways.read().unwrap_or_else(PoisonError::into_inner);
        gateways.contains_key(name)
    }
}
