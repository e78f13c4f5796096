//! Address-string query API
//!
//! [`QueryAdapter`] composes the codec and a [`QueryTransport`] into the
//! operations of [`ServerQuery`].

use crate::codec::{self, PacketKind, ServerInfo, ServerRules};
use crate::transport::{Exchange, QueryTransport, UdpTransport};
use async_trait::async_trait;
use sampq_core::config::QueryConfig;
use sampq_core::model::DEFAULT_PORT;
use sampq_core::{
    CancellationToken, Error, PlayerRecord, Result, ServerAddress, ServerQuery, ServerRecord,
};
use std::net::SocketAddrV4;
use tracing::{debug, warn};

/// Default player count above which the full query skips the player list
pub const DEFAULT_PLAYER_LIST_LIMIT: u32 = 70;

/// Live server query over the UDP protocol
pub struct QueryAdapter<T = UdpTransport> {
    transport: T,
    default_port: u16,
    player_list_limit: u32,
}

impl QueryAdapter<UdpTransport> {
    /// Create an adapter over UDP with default settings
    pub fn new() -> Self {
        Self::with_transport(UdpTransport::default())
    }

    /// Create an adapter over UDP from query settings
    pub fn from_config(config: &QueryConfig) -> Self {
        Self::with_transport(UdpTransport::from_config(config))
            .with_default_port(config.default_port)
            .with_player_list_limit(config.player_list_limit)
    }
}

impl Default for QueryAdapter<UdpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: QueryTransport> QueryAdapter<T> {
    /// Create an adapter over any transport
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            default_port: DEFAULT_PORT,
            player_list_limit: DEFAULT_PLAYER_LIST_LIMIT,
        }
    }

    /// Port assumed for bare hosts
    pub fn with_default_port(mut self, default_port: u16) -> Self {
        self.default_port = default_port;
        self
    }

    /// Player count above which the full query skips the player list
    pub fn with_player_list_limit(mut self, limit: u32) -> Self {
        self.player_list_limit = limit;
        self
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Parse `host[:port]` and resolve the host
    async fn endpoint(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> Result<(ServerAddress, SocketAddrV4)> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let address = ServerAddress::parse_with_default(host_port, self.default_port)?;
        let ip = self.transport.resolve(address.host(), token).await?;
        let target = SocketAddrV4::new(ip, address.port());
        Ok((address, target))
    }

    async fn request(
        &self,
        kind: PacketKind,
        target: SocketAddrV4,
        token: &CancellationToken,
    ) -> Result<Exchange> {
        let request = codec::encode_request(kind, target);
        let exchange = self.transport.exchange(target, &request, token).await?;
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(exchange)
    }

    async fn info_at(
        &self,
        address: &ServerAddress,
        target: SocketAddrV4,
        token: &CancellationToken,
    ) -> Result<ServerRecord> {
        let exchange = self.request(PacketKind::Info, target, token).await?;
        let info = codec::decode_info(&exchange.datagram)?;
        Ok(info_record(address, info).with_ping(exchange.rtt_ms()))
    }

    async fn rules_at(&self, target: SocketAddrV4, token: &CancellationToken) -> Result<ServerRules> {
        let exchange = self.request(PacketKind::Rules, target, token).await?;
        codec::decode_rules(&exchange.datagram)
    }

    async fn players_of_kind(
        &self,
        kind: PacketKind,
        target: SocketAddrV4,
        token: &CancellationToken,
    ) -> Result<Vec<PlayerRecord>> {
        let exchange = self.request(kind, target, token).await?;
        codec::decode_players(kind, &exchange.datagram)
    }

    /// Detailed list first; on any failure except cancellation, one brief attempt
    async fn players_at(
        &self,
        target: SocketAddrV4,
        token: &CancellationToken,
    ) -> Result<Vec<PlayerRecord>> {
        match self
            .players_of_kind(PacketKind::PlayersDetailed, target, token)
            .await
        {
            Ok(players) => Ok(players),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                warn!(
                    "Detailed player list from {} failed ({}), falling back to brief list",
                    target, e
                );
                self.players_of_kind(PacketKind::PlayersBrief, target, token)
                    .await
            }
        }
    }
}

fn info_record(address: &ServerAddress, info: ServerInfo) -> ServerRecord {
    ServerRecord::at(info.hostname, address)
        .with_game_mode(info.game_mode)
        .with_language(info.language)
        .with_player_counts(u32::from(info.players), u32::from(info.max_players))
        .with_password(info.password)
}

/// Overlay the rule-derived fields: lag compensation, version, web URL
fn apply_rules(record: ServerRecord, rules: &ServerRules) -> ServerRecord {
    record
        .with_lag_compensation(rules.lag_compensation())
        .with_version(rules.version.clone().unwrap_or_default())
        .with_web_url(rules.web_url())
}

#[async_trait]
impl<T: QueryTransport> ServerQuery for QueryAdapter<T> {
    async fn get_info(&self, host_port: &str, token: &CancellationToken) -> Result<ServerRecord> {
        let (address, target) = self.endpoint(host_port, token).await?;
        let record = self.info_at(&address, target, token).await?;
        Ok(record.with_ping(0))
    }

    async fn get_info_with_ping(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> Result<ServerRecord> {
        let (address, target) = self.endpoint(host_port, token).await?;
        self.info_at(&address, target, token).await
    }

    async fn get_rules(&self, host_port: &str, token: &CancellationToken) -> Result<ServerRecord> {
        let (address, target) = self.endpoint(host_port, token).await?;
        let rules = self.rules_at(target, token).await?;
        Ok(apply_rules(ServerRecord::at("", &address), &rules))
    }

    async fn get_players(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> Result<Vec<PlayerRecord>> {
        let (_, target) = self.endpoint(host_port, token).await?;
        self.players_at(target, token).await
    }

    async fn get_full_info(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> Result<ServerRecord> {
        let (address, target) = self.endpoint(host_port, token).await?;

        let info = self.info_at(&address, target, token).await?;
        let rules = self.rules_at(target, token).await?;
        let mut record = apply_rules(info, &rules).with_anti_cheat(rules.anti_cheat());

        if record.players_count() > self.player_list_limit {
            debug!(
                "Skipping player list for {}: {} players exceeds limit {}",
                address,
                record.players_count(),
                self.player_list_limit
            );
        } else {
            let players = self.players_at(target, token).await?;
            record.set_players(players.into_iter().map(|p| p.name).collect());
        }

        Ok(record)
    }

    async fn is_open_mp(&self, host_port: &str, token: &CancellationToken) -> Result<bool> {
        let (_, target) = self.endpoint(host_port, token).await?;
        match self.request(PacketKind::OpenMpProbe, target, token).await {
            Ok(exchange) => Ok(codec::payload(PacketKind::OpenMpProbe, &exchange.datagram).is_ok()),
            Err(e) if e.is_timeout() => {
                debug!("No open.mp probe reply from {}", target);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
