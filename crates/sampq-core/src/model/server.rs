//! Server records and addresses

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Port assumed when an address carries none
pub const DEFAULT_PORT: u16 = 7777;

/// Name carried by the unknown sentinel record
pub const UNKNOWN_SERVER_NAME: &str = "Unknown (server is not responding)";

/// Placeholder for string fields of the unknown sentinel record
const NOT_AVAILABLE: &str = "N/A";

/// A validated `host:port` pair
///
/// The host is either an IPv4 literal or a hostname; resolution happens
/// at query time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    /// Create an address from components
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the host is blank or contains a colon.
    pub fn new(host: impl Into<String>, port: u16) -> crate::Result<Self> {
        let host = host.into();
        let trimmed = host.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::invalid_input("Host cannot be empty"));
        }
        if trimmed.contains(':') {
            return Err(crate::Error::invalid_input(format!(
                "Host must not contain ':' ({trimmed})"
            )));
        }
        Ok(Self {
            host: trimmed.to_string(),
            port,
        })
    }

    /// Parse `host[:port]`, falling back to `default_port` when the port is
    /// missing or empty
    pub fn parse_with_default(input: &str, default_port: u16) -> crate::Result<Self> {
        let input = input.trim();
        match input.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.trim();
                let port = if port.is_empty() {
                    default_port
                } else {
                    port.parse::<u16>().map_err(|_| {
                        crate::Error::invalid_input(format!("Invalid port in address: {input}"))
                    })?
                };
                Self::new(host, port)
            }
            None => Self::new(input, default_port),
        }
    }

    /// Host part
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port part
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for ServerAddress {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_default(s, DEFAULT_PORT)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One game server's known state
///
/// Player count and max players come from the server (or a monitoring
/// snapshot) and may disagree with `players().len()`; the name list is
/// advisory only.
///
/// Records are built with the `with_*` methods and are otherwise immutable,
/// except for [`update_ping`](Self::update_ping),
/// [`set_players`](Self::set_players) and [`rename`](Self::rename).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    name: String,
    address: String,
    endpoint: Option<ServerAddress>,
    ping: u32,
    web_url: String,
    language: String,
    game_mode: String,
    version: String,
    players_count: u32,
    max_players: u32,
    players: Vec<String>,
    lag_compensation: bool,
    anti_cheat: bool,
    open_mp: bool,
    password: bool,
}

impl ServerRecord {
    /// Create a record with a name and a combined `host:port` address
    ///
    /// Components are kept only when the address parses; monitoring
    /// services occasionally publish addresses that do not.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        let address = address.into();
        let endpoint = address.parse::<ServerAddress>().ok();
        Self {
            name: name.into(),
            address,
            endpoint,
            ping: 0,
            web_url: String::new(),
            language: String::new(),
            game_mode: String::new(),
            version: String::new(),
            players_count: 0,
            max_players: 0,
            players: Vec::new(),
            lag_compensation: false,
            anti_cheat: false,
            open_mp: false,
            password: false,
        }
    }

    /// Create a record for a validated address
    pub fn at(name: impl Into<String>, endpoint: &ServerAddress) -> Self {
        let mut record = Self::new(name, endpoint.to_string());
        record.endpoint = Some(endpoint.clone());
        record
    }

    /// The "address known, data unobtainable" placeholder
    pub fn unknown(address: impl Into<String>) -> Self {
        Self::new(UNKNOWN_SERVER_NAME, address)
            .with_web_url(NOT_AVAILABLE)
            .with_language(NOT_AVAILABLE)
            .with_game_mode(NOT_AVAILABLE)
            .with_version(NOT_AVAILABLE)
    }

    /// Whether this is the unknown sentinel record
    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_SERVER_NAME
            && self.players_count == 0
            && self.max_players == 0
            && self.version == NOT_AVAILABLE
    }

    /// Set the round-trip latency
    pub fn with_ping(mut self, ping: u32) -> Self {
        self.ping = ping;
        self
    }

    /// Set the web URL
    pub fn with_web_url(mut self, web_url: impl Into<String>) -> Self {
        self.web_url = web_url.into();
        self
    }

    /// Set the language tag
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the game mode label
    pub fn with_game_mode(mut self, game_mode: impl Into<String>) -> Self {
        self.game_mode = game_mode.into();
        self
    }

    /// Set the version string
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set current and maximum player counts
    pub fn with_player_counts(mut self, players_count: u32, max_players: u32) -> Self {
        self.players_count = players_count;
        self.max_players = max_players;
        self
    }

    /// Set the player name list
    pub fn with_players(mut self, players: Vec<String>) -> Self {
        self.players = players;
        self
    }

    /// Set the lag-compensation flag
    pub fn with_lag_compensation(mut self, enabled: bool) -> Self {
        self.lag_compensation = enabled;
        self
    }

    /// Set the anti-cheat-presence flag
    pub fn with_anti_cheat(mut self, present: bool) -> Self {
        self.anti_cheat = present;
        self
    }

    /// Set the open.mp flag
    pub fn with_open_mp(mut self, open_mp: bool) -> Self {
        self.open_mp = open_mp;
        self
    }

    /// Set the password-protected flag
    pub fn with_password(mut self, password: bool) -> Self {
        self.password = password;
        self
    }

    /// Update the round-trip latency
    pub fn update_ping(&mut self, ping: u32) {
        self.ping = ping;
    }

    /// Replace the player name list
    ///
    /// An empty replacement never overwrites a previously known list.
    pub fn set_players(&mut self, players: Vec<String>) {
        if !players.is_empty() {
            self.players = players;
        }
    }

    /// Rename the server, ignoring blank names
    pub fn rename(&mut self, name: &str) {
        if !name.trim().is_empty() {
            self.name = name.to_string();
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Combined `host:port` address as published by the source
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Validated address components, if the address parsed
    pub fn endpoint(&self) -> Option<&ServerAddress> {
        self.endpoint.as_ref()
    }

    /// Round-trip latency in milliseconds (0 = unknown)
    pub fn ping(&self) -> u32 {
        self.ping
    }

    /// Web URL
    pub fn web_url(&self) -> &str {
        &self.web_url
    }

    /// Language tag
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Game mode label
    pub fn game_mode(&self) -> &str {
        &self.game_mode
    }

    /// Version string
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Current player count
    pub fn players_count(&self) -> u32 {
        self.players_count
    }

    /// Maximum player count
    pub fn max_players(&self) -> u32 {
        self.max_players
    }

    /// Player names, possibly partial
    pub fn players(&self) -> &[String] {
        &self.players
    }

    /// Lag compensation enabled
    pub fn lag_compensation(&self) -> bool {
        self.lag_compensation
    }

    /// Anti-cheat present
    pub fn anti_cheat(&self) -> bool {
        self.anti_cheat
    }

    /// Server runs open.mp
    pub fn open_mp(&self) -> bool {
        self.open_mp
    }

    /// Password protected
    pub fn password(&self) -> bool {
        self.password
    }

    /// Compare every field except ping
    pub fn eq_ignoring_ping(&self, other: &Self) -> bool {
        let mut other = other.clone();
        other.ping = self.ping;
        *self == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parsing() {
        let addr: ServerAddress = "127.0.0.1:7778".parse().unwrap();
        assert_eq!(addr.host(), "127.0.0.1");
        assert_eq!(addr.port(), 7778);

        let bare: ServerAddress = "play.example.com".parse().unwrap();
        assert_eq!(bare.port(), DEFAULT_PORT);

        let empty_port: ServerAddress = "1.2.3.4:".parse().unwrap();
        assert_eq!(empty_port.port(), DEFAULT_PORT);

        assert!("".parse::<ServerAddress>().is_err());
        assert!(":7777".parse::<ServerAddress>().is_err());
        assert!("1.2.3.4:port".parse::<ServerAddress>().is_err());
        assert!("1.2.3.4:70000".parse::<ServerAddress>().is_err());
    }

    #[test]
    fn test_address_display_round_trip() {
        let addr = ServerAddress::new("10.0.0.5", 8888).unwrap();
        assert_eq!(addr.to_string(), "10.0.0.5:8888");
        assert_eq!(addr.to_string().parse::<ServerAddress>().unwrap(), addr);
    }

    #[test]
    fn test_unknown_record() {
        let record = ServerRecord::unknown("1.2.3.4:7777");
        assert_eq!(record.name(), UNKNOWN_SERVER_NAME);
        assert_eq!(record.address(), "1.2.3.4:7777");
        assert_eq!(record.ping(), 0);
        assert_eq!(record.players_count(), 0);
        assert_eq!(record.max_players(), 0);
        assert_eq!(record.version(), "N/A");
        assert_eq!(record.web_url(), "N/A");
        assert!(record.players().is_empty());
        assert!(!record.password() && !record.open_mp() && !record.anti_cheat());
        assert!(record.is_unknown());
    }

    #[test]
    fn test_set_players_keeps_known_list_on_empty() {
        let mut record = ServerRecord::new("Test", "1.2.3.4:7777")
            .with_players(vec!["alice".to_string(), "bob".to_string()]);

        record.set_players(Vec::new());
        assert_eq!(record.players(), ["alice", "bob"]);

        record.set_players(vec!["carol".to_string()]);
        assert_eq!(record.players(), ["carol"]);
    }

    #[test]
    fn test_rename_ignores_blank() {
        let mut record = ServerRecord::new("Old", "1.2.3.4:7777");
        record.rename("   ");
        assert_eq!(record.name(), "Old");
        record.rename("New");
        assert_eq!(record.name(), "New");
    }

    #[test]
    fn test_update_ping_changes_only_ping() {
        let mut record = ServerRecord::new("Test", "1.2.3.4:7777")
            .with_player_counts(3, 50)
            .with_ping(80);
        let before = record.clone();

        record.update_ping(12);

        assert_eq!(record.ping(), 12);
        assert!(record.eq_ignoring_ping(&before));
    }

    #[test]
    fn test_unparsable_address_keeps_raw_string() {
        let record = ServerRecord::new("Weird", "not an address:abc");
        assert_eq!(record.address(), "not an address:abc");
        assert!(record.endpoint().is_none());
    }

    #[test]
    fn test_eq_ignoring_ping() {
        let a = ServerRecord::new("A", "1.2.3.4:7777").with_ping(12);
        let b = ServerRecord::new("A", "1.2.3.4:7777").with_ping(40);
        assert_ne!(a, b);
        assert!(a.eq_ignoring_ping(&b));
    }
}
