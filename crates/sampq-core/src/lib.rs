// # sampq-core
//
// Core library for discovering and querying SA-MP / open.mp game servers.
//
// ## Architecture Overview
//
// This library provides the pieces every data source converges on:
// - **ServerRecord / PlayerRecord**: The normalized domain shape
// - **MonitoringGateway**: Trait for REST monitoring services (bulk server lists)
// - **ServerQuery**: Trait for live UDP queries against a single server
// - **GatewayRegistry**: Plugin-based registry for monitoring gateways
// - **ServerListService**: Orchestration facade that validates input and routes
//   each request to the right source
//
// ## Source Routing
//
// 1. Bulk listing always goes to the currently selected gateway
// 2. Single-server detail and players always go to the live query
// 3. Gateways can be swapped at runtime without blocking in-flight queries
//
// Concrete implementations live in sibling crates (`sampq-query`,
// `sampq-monitor-samonitor`, `sampq-monitor-openmp`).

pub mod config;
pub mod error;
pub mod model;
pub mod registry;
pub mod service;
pub mod traits;

// Re-export core types for convenience
pub use config::{GatewayConfig, PortPolicy, QueryConfig, SampqConfig};
pub use error::{Error, Result};
pub use model::{PlayerRecord, ServerAddress, ServerRecord};
pub use registry::GatewayRegistry;
pub use service::ServerListService;
pub use traits::{GatewayResponse, MonitoringGateway, MonitoringGatewayFactory, ServerQuery};

/// Cancellation token passed into every async operation
pub use tokio_util::sync::CancellationToken;
