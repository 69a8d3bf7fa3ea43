// src/record.rs
use serde::{Deserialize, Serialize};

/// Crest shown until a feed supplies a real one.
pub const PLACEHOLDER_LOGO_URL: &str =
    "https://cdn.jsdelivr.net/gh/drnewske/tyhdsjax-nfhbqsm/logos/default.png";

/// Written into `time`/`date` when a feed gave us nothing usable.
pub const NOT_FOUND: &str = "Not Found";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamInfo {
    pub name: String,
    pub logo_url: String,
}

/// One fixture with its stream links; the unit of persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    #[serde(default)]
    pub source_name: String, // e.g. "Streamed", "Sportsonline"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub team1: TeamInfo,
    pub team2: TeamInfo,
    pub time: String, // "HH:MM" or "Not Found"
    pub date: String, // "DD-MM-YYYY" or "Not Found"
    pub links: Vec<String>,
    #[serde(default)]
    pub match_id: String,
    // Epoch millis kickoff when the feed supplies one; string date/time
    // parsing is the fallback for retention math.
    #[serde(rename = "_timestamp", default, skip_serializing_if = "Option::is_none")]
    pub kickoff_ms: Option<i64>,
}

/// Feed-side validity: a real team name, not a sentinel or blank.
pub fn is_valid_team_name(name: &str) -> bool {
    !matches!(name.trim(), "" | "Not Found" | "Name Not Found")
}

impl EventRecord {
    pub fn has_valid_teams(&self) -> bool {
        is_valid_team_name(&self.team1.name) && is_valid_team_name(&self.team2.name)
    }
}
