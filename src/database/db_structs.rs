use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Server {
    pub id: i32,
    pub name: String
}

/// A player as stored in the source log. Only players with a known
/// display name are ever returned by the source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub steam_id: String,
    pub name: String
}

#[derive(Debug, Clone, PartialEq)]
pub struct Death {
    pub attacker: Option<String>,
    pub victim: Option<String>,
    pub teamkill: bool,
    pub server: i32,
    pub match_id: i32,
    pub layer: Option<String>
}

/// An incapacitation ("down"). The victim is not dead yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Incap {
    pub attacker: Option<String>,
    pub victim: Option<String>,
    pub teamkill: bool,
    pub server: i32,
    pub match_id: i32,
    pub layer: Option<String>,
    pub damage: Option<f64>
}

#[derive(Debug, Clone, PartialEq)]
pub struct Revive {
    pub reviver: Option<String>,
    pub victim: Option<String>,
    pub server: i32,
    pub match_id: i32,
    pub layer: Option<String>
}

/// Narrows an event query. An empty filter returns the whole log.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EventFilter {
    pub server_id: Option<i32>,
    /// Only events at or after this instant
    pub since: Option<DateTime<Utc>>
}
