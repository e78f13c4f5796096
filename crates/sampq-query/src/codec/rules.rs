//! Typed server rules
//!
//! The rules reply is a flat list of string pairs. Values are typed by rule
//! name through an explicit dispatch table; unknown names are ignored.

use chrono::NaiveTime;

/// Gravity reported by an unmodified server
pub const DEFAULT_GRAVITY: f64 = 0.008;

/// Web URL assumed when a server publishes none
pub const DEFAULT_WEB_URL: &str = "https://sa-mp.mp/";

/// Outcome of parsing one rule value
///
/// `Defaulted` means the rule was absent or blank and the schema default
/// applies. `Rejected` means a value was present but did not parse; readers
/// fall back to the default for it as well, but the distinction stays
/// visible.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// The raw value parsed cleanly
    Value(T),
    /// No usable raw value; the schema default
    Defaulted(T),
    /// The raw value was present but unparsable
    Rejected,
}

impl<T> Parsed<T> {
    /// Parse `raw` with `parse`, defaulting blank input
    pub fn parse_or(raw: &str, default: T, parse: impl FnOnce(&str) -> Option<T>) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Parsed::Defaulted(default);
        }
        match parse(raw) {
            Some(value) => Parsed::Value(value),
            None => Parsed::Rejected,
        }
    }

    /// The parsed or defaulted value
    pub fn into_value(self) -> Option<T> {
        match self {
            Parsed::Value(value) | Parsed::Defaulted(value) => Some(value),
            Parsed::Rejected => None,
        }
    }

    /// The parsed or defaulted value, or `fallback` when rejected
    pub fn value_or(self, fallback: T) -> T {
        self.into_value().unwrap_or(fallback)
    }

    /// Whether the raw value parsed cleanly
    pub fn is_value(&self) -> bool {
        matches!(self, Parsed::Value(_))
    }

    /// Whether the raw value was rejected
    pub fn is_rejected(&self) -> bool {
        matches!(self, Parsed::Rejected)
    }
}

/// Rules a server reports, typed by name
#[derive(Debug, Clone, PartialEq)]
pub struct ServerRules {
    pub lag_compensation: Parsed<bool>,
    pub map_name: Option<String>,
    pub version: Option<String>,
    /// Present only when the server runs the SAMPCAC anti-cheat
    pub sampcac_version: Option<String>,
    pub allowed_clients: Option<String>,
    pub artwork: Parsed<bool>,
    pub weather: Parsed<i32>,
    pub gravity: Parsed<f64>,
    pub web_url: Parsed<String>,
    pub world_time: Parsed<NaiveTime>,
}

impl Default for ServerRules {
    fn default() -> Self {
        Self {
            lag_compensation: Parsed::Defaulted(false),
            map_name: None,
            version: None,
            sampcac_version: None,
            allowed_clients: None,
            artwork: Parsed::Defaulted(false),
            weather: Parsed::Defaulted(0),
            gravity: Parsed::Defaulted(DEFAULT_GRAVITY),
            web_url: Parsed::Defaulted(DEFAULT_WEB_URL.to_string()),
            world_time: Parsed::Defaulted(NaiveTime::MIN),
        }
    }
}

impl ServerRules {
    /// Build typed rules from raw name/value pairs
    ///
    /// Later duplicates overwrite earlier ones.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut rules = Self::default();
        for (name, value) in pairs {
            rules.apply(name, value);
        }
        rules
    }

    /// Apply one raw rule
    pub fn apply(&mut self, name: &str, value: &str) {
        let key = name.trim().to_ascii_lowercase().replace(' ', "_");
        match key.as_str() {
            "lagcomp" => self.lag_compensation = Parsed::parse_or(value, false, parse_on_off),
            "mapname" => self.map_name = non_blank(value),
            "version" => self.version = non_blank(value),
            "sampcac_version" => self.sampcac_version = non_blank(value),
            "allowed_clients" => self.allowed_clients = non_blank(value),
            "artwork" => self.artwork = Parsed::parse_or(value, false, parse_on_yes),
            "weather" => self.weather = Parsed::parse_or(value, 0, |v| v.parse().ok()),
            "gravity" => {
                self.gravity = Parsed::parse_or(value, DEFAULT_GRAVITY, |v| {
                    v.parse::<f64>().ok().filter(|g| g.is_finite())
                })
            }
            "weburl" => {
                self.web_url =
                    Parsed::parse_or(value, DEFAULT_WEB_URL.to_string(), parse_web_url)
            }
            "worldtime" => {
                self.world_time = Parsed::parse_or(value, NaiveTime::MIN, parse_world_time)
            }
            _ => {}
        }
    }

    /// Lag compensation enabled
    pub fn lag_compensation(&self) -> bool {
        self.lag_compensation.clone().value_or(false)
    }

    /// Web URL, defaulted when absent or unparsable
    pub fn web_url(&self) -> String {
        self.web_url
            .clone()
            .value_or(DEFAULT_WEB_URL.to_string())
    }

    /// Whether an anti-cheat is advertised
    pub fn anti_cheat(&self) -> bool {
        self.sampcac_version.is_some()
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_on_yes(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Some(true),
        "off" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Accept absolute http(s) URLs; bare hosts get an `http://` scheme
fn parse_web_url(value: &str) -> Option<String> {
    if value.chars().any(char::is_whitespace) {
        return None;
    }
    let lower = value.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(value.to_string());
    }
    if lower.contains("://") || !value.contains('.') {
        return None;
    }
    Some(format!("http://{value}"))
}

/// `HH:MM`, `HH:MM:SS` or a bare hour (`12`, `12h`)
fn parse_world_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
        .or_else(|| {
            let hour: u32 = value.trim_end_matches(['h', 'H']).parse().ok()?;
            NaiveTime::from_hms_opt(hour, 0, 0)
        })
}
