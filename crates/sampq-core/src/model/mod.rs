//! Domain model shared by every data source
//!
//! - [`ServerRecord`]: One server's known state, normalized across sources
//! - [`ServerAddress`]: Validated `host:port` components
//! - [`PlayerRecord`]: One entry of a live player list

pub mod player;
pub mod server;

pub use player::PlayerRecord;
pub use server::{DEFAULT_PORT, ServerAddress, ServerRecord, UNKNOWN_SERVER_NAME};
