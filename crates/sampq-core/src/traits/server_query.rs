// # Server Query Trait
//
// Defines the live, address-string-based query API consumed by the
// orchestration layer.
//
// ## Implementations
//
// - UDP query protocol: `sampq-query` crate (`QueryAdapter`)
//
// ## Address Format
//
// Every operation takes `"host[:port]"`. The host is an IPv4 literal or a
// hostname; a missing port means 7777. The port window is enforced by the
// caller (`ServerListService`), not here.

use crate::model::{PlayerRecord, ServerRecord};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Trait for live server query implementations
///
/// # Error Semantics
///
/// - `Error::Timeout`: the server did not answer in time
/// - `Error::Resolve`: the host has no IPv4 address
/// - `Error::Malformed`: the reply was structurally invalid
/// - `Error::Cancelled`: the token fired; distinct from all of the above
///
/// Implementations do not retry, except for the single documented fallback
/// from the detailed to the brief player list.
#[async_trait]
pub trait ServerQuery: Send + Sync {
    /// Basic server information without rules or players; ping is 0
    async fn get_info(&self, host_port: &str, token: &CancellationToken)
    -> crate::Result<ServerRecord>;

    /// Basic server information with ping set from the measured round trip
    async fn get_info_with_ping(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> crate::Result<ServerRecord>;

    /// Rule-derived fields only (lag compensation, version, web URL, anti-cheat)
    async fn get_rules(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> crate::Result<ServerRecord>;

    /// Player list, detailed variant first, brief variant as fallback
    async fn get_players(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> crate::Result<Vec<PlayerRecord>>;

    /// Info, rules and players merged into one record
    async fn get_full_info(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> crate::Result<ServerRecord>;

    /// Best-effort open.mp detection; a timeout means `false`
    async fn is_open_mp(&self, host_port: &str, token: &CancellationToken) -> crate::Result<bool>;
}
