use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenRequest {
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: String,
    pub scope: String
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Expire time in seconds
    pub expires_in: u64
}

/// One snapshot of a match as of a single fetch. Events are sorted ascending
/// by id and ids are unique; `normalize` restores the invariant on frames
/// straight off the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchFrame {
    #[serde(rename = "match")]
    pub info: MatchInfo,
    pub events: Vec<MatchEvent>,
    pub users: Vec<MatchUser>,
    /// Id of the first event included in this frame
    pub first_event_id: i64,
    pub latest_event_id: i64,
    pub current_game_id: Option<i64>
}

impl MatchFrame {
    /// Sorts events ascending by id and drops duplicate ids, keeping the
    /// later copy. Users are deduplicated by id the same way.
    pub fn normalize(mut self) -> MatchFrame {
        let mut events: BTreeMap<i64, MatchEvent> = BTreeMap::new();
        for event in self.events.drain(..) {
            events.insert(event.id, event);
        }
        self.events = events.into_values().collect();

        let mut users: BTreeMap<i64, MatchUser> = BTreeMap::new();
        for user in self.users.drain(..) {
            users.insert(user.id, user);
        }
        self.users = users.into_values().collect();

        self
    }

    pub fn last_event_time(&self) -> Option<DateTime<FixedOffset>> {
        self.events.last().map(|e| e.timestamp)
    }

    pub fn ended(&self) -> bool {
        self.info.end_time.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchInfo {
    pub id: i64,
    pub name: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: Option<DateTime<FixedOffset>>
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchEvent {
    pub id: i64,
    pub detail: EventDetail,
    pub timestamp: DateTime<FixedOffset>,
    pub user_id: Option<i64>,
    pub game: Option<Game>
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchUser {
    pub id: i64,
    pub username: String,
    pub country_code: Option<String>
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    pub id: i64,
    pub beatmap_id: i64,
    /// Lobby-level mod bitmask; freemod lobbies carry the real mods per score
    pub mods: u32,
    pub scores: Vec<GameScore>
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameScore {
    pub user_id: i64,
    pub accuracy: f64,
    pub max_combo: i32,
    pub score: i64,
    pub passed: bool,
    /// Raw per-score mod bitmask
    pub mods: u32,
    /// Performance-points value supplied upstream, when available
    pub pp: Option<f64>
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct MatchListPage {
    pub matches: Vec<MatchSummary>,
    pub cursor: Option<MatchListCursor>
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: i64,
    pub name: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: Option<DateTime<FixedOffset>>
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchListCursor {
    pub match_id: i64
}
