//! Player list entries

use serde::{Deserialize, Serialize};

/// One player as reported by a server or a monitoring service
///
/// `id` is the protocol-assigned slot for the duration of one query. It is
/// not a stable identity, and the brief player list reports it as 0 for
/// everyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Slot id
    pub id: u16,
    /// Display name
    pub name: String,
    /// Score
    pub score: i32,
    /// Ping in milliseconds
    pub ping: i32,
}

impl PlayerRecord {
    /// Create a new player record
    pub fn new(id: u16, name: impl Into<String>, score: i32, ping: i32) -> Self {
        Self {
            id,
            name: name.into(),
            score,
            ping,
        }
    }

    /// Create a record from the brief list, which carries no id or ping
    pub fn brief(name: impl Into<String>, score: i32) -> Self {
        Self::new(0, name, score, 0)
    }
}
