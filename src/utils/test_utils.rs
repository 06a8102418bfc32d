//! Synthetic data generators for unit and integration tests.

use crate::{
    api::api_structs::{EventDetail, Game, GameScore, MatchEvent, MatchFrame, MatchInfo, MatchUser},
    database::db_structs::BeatmapDifficulty
};
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn base_time() -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap().fixed_offset()
}

pub fn generate_score(player_id: i64, score: i64, max_combo: i32, accuracy: f64, mods: u32) -> GameScore {
    GameScore {
        user_id: player_id,
        accuracy,
        max_combo,
        score,
        passed: true,
        mods,
        pp: None
    }
}

pub fn generate_game(id: i64, beatmap_id: i64, mods: u32, scores: &[GameScore]) -> Game {
    Game {
        id,
        beatmap_id,
        mods,
        scores: scores.to_vec()
    }
}

/// Neutral difficulty attributes: no threshold-gated skillset qualifies until
/// a test moves a field past its boundary.
pub fn generate_difficulty(beatmap_id: i64, mods: u32) -> BeatmapDifficulty {
    BeatmapDifficulty {
        beatmap_id,
        mods,
        aim: 3.0,
        speed: 3.0,
        slider_factor: 1.0,
        bpm: 180.0,
        circle_size: 4.0,
        approach_rate: 9.0,
        star_rating: 5.0
    }
}

/// A lobby event with no embedded game. Timestamps advance with the id so
/// event order matches time order.
pub fn generate_event(id: i64) -> MatchEvent {
    MatchEvent {
        id,
        detail: EventDetail {
            kind: "other".to_string(),
            text: None
        },
        timestamp: base_time() + Duration::seconds(id),
        user_id: None,
        game: None
    }
}

/// An event carrying a game with two passing scores, enough for a bucket.
pub fn generate_game_event(id: i64, game_id: i64) -> MatchEvent {
    let scores = [
        generate_score(1, 100_000, 250, 0.95, 0),
        generate_score(2, 90_000, 200, 0.93, 0)
    ];

    MatchEvent {
        id,
        detail: EventDetail {
            kind: "game".to_string(),
            text: None
        },
        timestamp: base_time() + Duration::seconds(id),
        user_id: None,
        game: Some(generate_game(game_id, 100, 0, &scores))
    }
}

pub fn generate_user(id: i64) -> MatchUser {
    MatchUser {
        id,
        username: format!("player-{id}"),
        country_code: Some("US".to_string())
    }
}

pub fn generate_frame(match_id: i64, events: Vec<MatchEvent>, current_game_id: Option<i64>) -> MatchFrame {
    let mut events = events;
    events.sort_by_key(|e| e.id);

    let first_event_id = events.first().map(|e| e.id).unwrap_or(0);
    let latest_event_id = events.last().map(|e| e.id).unwrap_or(0);

    MatchFrame {
        info: MatchInfo {
            id: match_id,
            name: format!("Test Match {match_id}"),
            start_time: base_time(),
            end_time: None
        },
        events,
        users: Vec::new(),
        first_event_id,
        latest_event_id,
        current_game_id
    }
}

/// Deterministic rng for property-style tests.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A randomized but reproducible set of scores for `player_count` players.
pub fn generate_random_scores(rng: &mut ChaCha8Rng, player_count: usize, mods: u32) -> Vec<GameScore> {
    (0..player_count)
        .map(|i| {
            generate_score(
                i as i64 + 1,
                rng.random_range(10_000..1_000_000),
                rng.random_range(50..1500),
                rng.random_range(0.70..1.0),
                mods
            )
        })
        .collect()
}
