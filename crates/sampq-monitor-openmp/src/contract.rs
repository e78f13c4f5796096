//! open.mp monitor JSON shapes
//!
//! `/servers` entries come in two layouts: the flat core object, or the
//! detailed layout with `core` and `ru` (rules) sub-objects. Both map onto
//! the same record; only the detailed layout carries rule values.

use sampq_core::ServerRecord;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Core server fields, as returned by the list endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CoreInfo {
    /// `host:port`
    pub ip: Option<String>,
    /// Hostname
    pub hn: Option<String>,
    /// Players online
    pub pc: Option<u32>,
    /// Player slots
    pub pm: Option<u32>,
    /// Game mode
    pub gm: Option<String>,
    /// Language
    pub la: Option<String>,
    /// Password required
    pub pa: Option<bool>,
    /// Version string
    pub vn: Option<String>,
    /// Runs open.mp
    pub omp: Option<bool>,
    /// Partner listing flag
    pub pr: Option<bool>,
}

/// Rule values of the detailed layout, all strings as the server reports them
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RuleInfo {
    pub allowed_clients: Option<String>,
    pub artwork: Option<String>,
    pub lagcomp: Option<String>,
    pub mapname: Option<String>,
    pub version: Option<String>,
    pub weather: Option<String>,
    pub weburl: Option<String>,
    pub worldtime: Option<String>,
}

impl RuleInfo {
    fn lag_compensation(&self) -> bool {
        self.lagcomp
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("on"))
    }
}

/// Detailed `/servers` entry
#[derive(Debug, Deserialize)]
pub struct DetailedEntry {
    #[serde(default)]
    pub ip: Option<String>,
    pub core: CoreInfo,
    #[serde(default)]
    pub ru: RuleInfo,
}

/// One `/servers` entry
///
/// The layout is chosen by the presence of a `core` key, so a detailed
/// entry with a broken `core` is rejected instead of read as a flat one.
#[derive(Debug)]
pub enum OpenMpServer {
    Detailed(DetailedEntry),
    Flat(CoreInfo),
}

impl<'de> Deserialize<'de> for OpenMpServer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let detailed = value
            .as_object()
            .is_some_and(|object| object.contains_key("core"));
        if detailed {
            DetailedEntry::deserialize(value)
                .map(OpenMpServer::Detailed)
                .map_err(<D::Error as de::Error>::custom)
        } else {
            CoreInfo::deserialize(value)
                .map(OpenMpServer::Flat)
                .map_err(<D::Error as de::Error>::custom)
        }
    }
}

impl OpenMpServer {
    /// Map onto the domain record; `None` when the entry carries no address
    pub fn into_record(self) -> Option<ServerRecord> {
        let (outer_ip, core, rules) = match self {
            OpenMpServer::Detailed(DetailedEntry { ip, core, ru }) => (ip, core, Some(ru)),
            OpenMpServer::Flat(core) => (None, core, None),
        };

        let address = core
            .ip
            .clone()
            .filter(|a| !a.trim().is_empty())
            .or(outer_ip)
            .filter(|a| !a.trim().is_empty())?;

        let version = core
            .vn
            .filter(|v| !v.is_empty())
            .or_else(|| rules.as_ref().and_then(|r| r.version.clone()))
            .unwrap_or_default();

        let mut record = ServerRecord::new(core.hn.unwrap_or_default(), address.trim())
            .with_language(core.la.unwrap_or_default())
            .with_game_mode(core.gm.unwrap_or_default())
            .with_version(version)
            .with_player_counts(core.pc.unwrap_or_default(), core.pm.unwrap_or_default())
            .with_open_mp(core.omp.unwrap_or_default())
            .with_password(core.pa.unwrap_or_default());

        if let Some(rules) = rules {
            record = record
                .with_lag_compensation(rules.lag_compensation())
                .with_web_url(rules.weburl.unwrap_or_default());
        }
        Some(record)
    }
}

/// Parse a server list entry by entry, skipping entries that do not fit
pub fn parse_servers(entries: Vec<Value>) -> Vec<ServerRecord> {
    let total = entries.len();
    let servers: Vec<ServerRecord> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<OpenMpServer>(entry) {
            Ok(server) => server.into_record(),
            Err(e) => {
                debug!("Skipping malformed open.mp entry: {}", e);
                None
            }
        })
        .collect();
    if servers.len() < total {
        warn!(
            "Skipped {} of {} open.mp entries",
            total - servers.len(),
            total
        );
    }
    servers
}
