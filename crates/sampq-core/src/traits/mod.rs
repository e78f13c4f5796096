//! Core traits
//!
//! This module defines the abstract interfaces the orchestration layer
//! depends on.
//!
//! - [`MonitoringGateway`]: Fetch bulk server lists from a REST monitoring service
//! - [`ServerQuery`]: Query one live server over the UDP query protocol

pub mod monitoring_gateway;
pub mod server_query;

pub use monitoring_gateway::{GatewayResponse, MonitoringGateway, MonitoringGatewayFactory};
pub use server_query::ServerQuery;
