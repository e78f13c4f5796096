//! SAMonitor JSON shapes and their mapping onto the domain model
//!
//! Every field is optional: the provider's schema is not versioned and
//! fields come and go. Unknown fields are ignored.

use sampq_core::{PlayerRecord, ServerRecord};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// `sampCac` value meaning "no anti-cheat"
const ANTI_CHEAT_ABSENT: &str = "Not required";

/// One server as returned by `GetAllServers` and `GetServerByIP`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaMonitorServer {
    pub name: Option<String>,
    pub ip_addr: Option<String>,
    pub website: Option<String>,
    pub language: Option<String>,
    pub game_mode: Option<String>,
    pub version: Option<String>,
    pub map_name: Option<String>,
    pub players_online: Option<u32>,
    pub max_players: Option<u32>,
    pub lag_comp: Option<bool>,
    pub samp_cac: Option<String>,
    pub is_open_mp: Option<bool>,
    pub requires_password: Option<bool>,
    pub weather: Option<i32>,
    pub world_time: Option<String>,
    pub last_updated: Option<String>,
}

impl SaMonitorServer {
    /// Whether the server advertises an anti-cheat
    pub fn anti_cheat(&self) -> bool {
        match self.samp_cac.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(value) => !value.eq_ignore_ascii_case(ANTI_CHEAT_ABSENT),
        }
    }

    /// Map onto the domain record; `None` when the entry carries no address
    pub fn into_record(self) -> Option<ServerRecord> {
        let anti_cheat = self.anti_cheat();
        let address = self.ip_addr.filter(|a| !a.trim().is_empty())?;
        Some(
            ServerRecord::new(self.name.unwrap_or_default(), address.trim())
                .with_web_url(self.website.unwrap_or_default())
                .with_language(self.language.unwrap_or_default())
                .with_game_mode(self.game_mode.unwrap_or_default())
                .with_version(self.version.unwrap_or_default())
                .with_player_counts(
                    self.players_online.unwrap_or_default(),
                    self.max_players.unwrap_or_default(),
                )
                .with_lag_compensation(self.lag_comp.unwrap_or_default())
                .with_anti_cheat(anti_cheat)
                .with_open_mp(self.is_open_mp.unwrap_or_default())
                .with_password(self.requires_password.unwrap_or_default()),
        )
    }
}

/// One player as returned by `GetServerPlayers`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SaMonitorPlayer {
    pub id: i64,
    pub name: String,
    pub score: i32,
    pub ping: i32,
}

impl From<SaMonitorPlayer> for PlayerRecord {
    fn from(player: SaMonitorPlayer) -> Self {
        PlayerRecord::new(
            u16::try_from(player.id).unwrap_or_default(),
            player.name,
            player.score,
            player.ping,
        )
    }
}

/// Parse a server list entry by entry, skipping entries that do not fit
pub fn parse_servers(entries: Vec<Value>) -> Vec<ServerRecord> {
    let total = entries.len();
    let servers: Vec<ServerRecord> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<SaMonitorServer>(entry) {
            Ok(server) => server.into_record(),
            Err(e) => {
                debug!("Skipping malformed SAMonitor entry: {}", e);
                None
            }
        })
        .collect();
    if servers.len() < total {
        warn!(
            "Skipped {} of {} SAMonitor entries",
            total - servers.len(),
            total
        );
    }
    servers
}

/// Parse a players payload, either `{"players": [...]}` or a bare array
pub fn parse_players(payload: Value) -> Option<Vec<PlayerRecord>> {
    let entries = match payload {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("players") {
            Some(Value::Array(entries)) => entries,
            _ => return None,
        },
        _ => return None,
    };
    Some(
        entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value::<SaMonitorPlayer>(entry).ok())
            .map(PlayerRecord::from)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": 1402,
            "success": true,
            "lastUpdated": "2024-05-01T10:00:00",
            "worldTime": "2024-05-01T12:00:00",
            "playersOnline": 57,
            "maxPlayers": 500,
            "isOpenMp": true,
            "lagComp": true,
            "name": "Arizona Role Play",
            "gameMode": "Arizona RP",
            "ipAddr": "185.169.134.3:7777",
            "mapName": "San Andreas",
            "website": "arizona-rp.com",
            "version": "0.3.7-R5",
            "language": "Русский",
            "sampCac": "Not required",
            "requiresPassword": false,
            "shuffledOrder": 3,
            "weather": 10,
            "sponsor": false
        })
    }

    #[test]
    fn test_maps_flat_entry() {
        let record = parse_servers(vec![sample()]).remove(0);
        assert_eq!(record.name(), "Arizona Role Play");
        assert_eq!(record.address(), "185.169.134.3:7777");
        assert_eq!(record.endpoint().map(|e| e.port()), Some(7777));
        assert_eq!(record.players_count(), 57);
        assert_eq!(record.max_players(), 500);
        assert_eq!(record.language(), "Русский");
        assert!(record.lag_compensation());
        assert!(record.open_mp());
        assert!(!record.anti_cheat());
        assert!(!record.password());
        assert_eq!(record.ping(), 0);
    }

    #[test]
    fn test_anti_cheat_sentinel() {
        let mut entry = sample();
        entry["sampCac"] = json!("Required");
        let record = parse_servers(vec![entry]).remove(0);
        assert!(record.anti_cheat());

        let mut entry = sample();
        entry["sampCac"] = Value::Null;
        let record = parse_servers(vec![entry]).remove(0);
        assert!(!record.anti_cheat());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let entries = vec![
            sample(),
            json!({ "name": "No address" }),
            json!({ "ipAddr": "1.2.3.4:7777", "playersOnline": "many" }),
            json!(42),
        ];
        let servers = parse_servers(entries);
        assert_eq!(servers.len(), 1);
    }

    #[test]
    fn test_parse_players_shapes() {
        let wrapped = json!({ "players": [ { "id": 3, "name": "alice", "score": 10, "ping": 40 } ] });
        let players = parse_players(wrapped).unwrap();
        assert_eq!(players, [PlayerRecord::new(3, "alice", 10, 40)]);

        let bare = json!([ { "id": 1, "name": "bob" }, "garbage" ]);
        let players = parse_players(bare).unwrap();
        assert_eq!(players, [PlayerRecord::new(1, "bob", 0, 0)]);

        assert!(parse_players(json!({ "error": "deprecated" })).is_none());
    }
}
