use crate::{
    api::api_structs::MatchFrame,
    model::{
        constants::{DEFAULT_MU, DEFAULT_SIGMA},
        structures::rating_attribute::RatingAttribute
    }
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Lifecycle of a tracked match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MatchStatus {
    /// Discovered but never polled
    Pending = 0,
    /// Actively polled for new events
    Ingesting = 1,
    /// Newest event implausibly old; polling abandoned
    Stalled = 2,
    /// Completed and rated
    Calculated = 3,
    /// Ingestion or calculation failed; see error_log
    Error = 4
}

impl TryFrom<i32> for MatchStatus {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, ()> {
        match v {
            0 => Ok(MatchStatus::Pending),
            1 => Ok(MatchStatus::Ingesting),
            2 => Ok(MatchStatus::Stalled),
            3 => Ok(MatchStatus::Calculated),
            4 => Ok(MatchStatus::Error),
            _ => Err(())
        }
    }
}

/// Stored ingestion state for one match: the cumulative merged snapshot and
/// the watermark of the last fully-consumed event.
#[derive(Debug, Clone)]
pub struct TrackedMatch {
    pub match_id: i64,
    pub cursor: i64,
    pub status: MatchStatus,
    pub frame: Option<MatchFrame>,
    pub last_event_time: Option<DateTime<FixedOffset>>
}

/// Difficulty attributes for one (beatmap, normalized mods) combination,
/// supplied by the external performance lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BeatmapDifficulty {
    pub beatmap_id: i64,
    pub mods: u32,
    pub aim: f64,
    pub speed: f64,
    pub slider_factor: f64,
    pub bpm: f64,
    pub circle_size: f64,
    pub approach_rate: f64,
    pub star_rating: f64
}

/// A player's Bayesian rating under one rating attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRating {
    pub player_id: i64,
    pub attribute: RatingAttribute,
    pub mu: f64,
    pub sigma: f64,
    pub ordinal: f64,
    pub star_ratings: Vec<f64>,
    pub games_played: i32
}

impl PlayerRating {
    /// The default prior for a never-seen (player, attribute) pair.
    pub fn prior(player_id: i64, attribute: RatingAttribute) -> PlayerRating {
        PlayerRating {
            player_id,
            attribute,
            mu: DEFAULT_MU,
            sigma: DEFAULT_SIGMA,
            ordinal: 0.0,
            star_ratings: Vec::new(),
            games_played: 0
        }
    }

    pub fn star_rating_mean(&self) -> Option<f64> {
        if self.star_ratings.is_empty() {
            return None;
        }

        Some(self.star_ratings.iter().sum::<f64>() / self.star_ratings.len() as f64)
    }
}

/// Before/after deltas for one player under one attribute in one match. Only
/// reported to collaborators, never read back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingHistory {
    pub player_id: i64,
    pub attribute: RatingAttribute,
    pub match_id: i64,
    pub ordinal_before: f64,
    pub ordinal_after: f64,
    pub star_rating_before: Option<f64>,
    pub star_rating_after: Option<f64>
}
