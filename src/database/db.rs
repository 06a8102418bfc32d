use super::db_structs::{BeatmapDifficulty, MatchStatus, PlayerRating, TrackedMatch};
use crate::{api::api_structs::MatchFrame, model::structures::rating_attribute::RatingAttribute};
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;
use thiserror::Error;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database query failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("failed to encode stored payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown rating attribute id {0}")]
    UnknownAttribute(i32)
}

/// Postgres collaborator for match ingestion state, ratings and beatmap
/// difficulty lookups.
///
/// Tables: `matches(match_id, status, cursor, frame, last_event_time,
/// error_log)`, `ratings(player_id, attribute_id, mu, sigma, ordinal,
/// star_ratings, games_played)`, `beatmap_difficulties(beatmap_id, mods, …)`.
#[derive(Clone)]
pub struct DbClient {
    client: Arc<Client>
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self, DbError> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        Ok(DbClient {
            client: Arc::new(client)
        })
    }

    /// Highest match id ever registered, or 0 when none. Discovery resumes
    /// from here.
    pub async fn get_last_match_id(&self) -> Result<i64, DbError> {
        let row = self
            .client
            .query_one("SELECT COALESCE(MAX(match_id), 0) AS last_id FROM matches", &[])
            .await?;

        Ok(row.get::<_, i64>("last_id"))
    }

    /// Registers a newly discovered match. Already-known ids are ignored.
    pub async fn register_match(&self, match_id: i64) -> Result<(), DbError> {
        self.client
            .execute(
                "INSERT INTO matches (match_id, status, cursor) VALUES ($1, $2, 0) ON CONFLICT (match_id) DO NOTHING",
                &[&match_id, &(MatchStatus::Pending as i32)]
            )
            .await?;

        Ok(())
    }

    pub async fn get_matches_by_status(&self, statuses: &[MatchStatus]) -> Result<Vec<TrackedMatch>, DbError> {
        let status_ids: Vec<i32> = statuses.iter().map(|s| *s as i32).collect();

        let rows = self
            .client
            .query(
                "SELECT match_id, status, cursor, frame::text AS frame, last_event_time
                 FROM matches
                 WHERE status = ANY($1)
                 ORDER BY match_id",
                &[&status_ids]
            )
            .await?;

        let mut matches = Vec::with_capacity(rows.len());
        for row in rows {
            match Self::tracked_match_from_row(&row) {
                Ok(m) => matches.push(m),
                Err(e) => warn!(match_id = row.get::<_, i64>("match_id"), "skipping undecodable match row: {e}")
            }
        }

        Ok(matches)
    }

    /// Persists the merged snapshot and its advanced cursor in one statement,
    /// so a cursor is never visible without the frame it belongs to.
    pub async fn save_match_state(
        &self,
        match_id: i64,
        frame: &MatchFrame,
        cursor: i64,
        last_event_time: Option<DateTime<FixedOffset>>
    ) -> Result<(), DbError> {
        let frame_json = serde_json::to_string(frame)?;

        self.client
            .execute(
                "UPDATE matches
                 SET frame = $2, cursor = $3, last_event_time = $4, status = $5
                 WHERE match_id = $1",
                &[
                    &match_id,
                    &frame_json,
                    &cursor,
                    &last_event_time,
                    &(MatchStatus::Ingesting as i32)
                ]
            )
            .await?;

        Ok(())
    }

    pub async fn set_match_status(&self, match_id: i64, status: MatchStatus) -> Result<(), DbError> {
        self.client
            .execute(
                "UPDATE matches SET status = $2 WHERE match_id = $1",
                &[&match_id, &(status as i32)]
            )
            .await?;

        Ok(())
    }

    /// Flags a match as failed and stores the error text for downstream
    /// consumers. Never raises past the match boundary.
    pub async fn flag_match_error(&self, match_id: i64, log_text: &str) -> Result<(), DbError> {
        self.client
            .execute(
                "UPDATE matches SET status = $2, error_log = $3 WHERE match_id = $1",
                &[&match_id, &(MatchStatus::Error as i32), &log_text]
            )
            .await?;

        Ok(())
    }

    pub async fn get_ratings(&self) -> Result<Vec<PlayerRating>, DbError> {
        info!("Fetching ratings...");
        let rows = self
            .client
            .query(
                "SELECT player_id, attribute_id, mu, sigma, ordinal, star_ratings::text AS star_ratings, games_played
                 FROM ratings",
                &[]
            )
            .await?;

        let mut ratings = Vec::with_capacity(rows.len());
        for row in rows {
            match Self::rating_from_row(&row) {
                Ok(r) => ratings.push(r),
                Err(e) => warn!("skipping undecodable rating row: {e}")
            }
        }

        info!("Fetched {} ratings", ratings.len());
        Ok(ratings)
    }

    pub async fn upsert_ratings(&self, ratings: &[PlayerRating]) -> Result<(), DbError> {
        for rating in ratings {
            let star_ratings = serde_json::to_string(&rating.star_ratings)?;

            self.client
                .execute(
                    "INSERT INTO ratings (player_id, attribute_id, mu, sigma, ordinal, star_ratings, games_played)
                     VALUES ($1, $2, $3, $4, $5, $6, $7)
                     ON CONFLICT (player_id, attribute_id)
                     DO UPDATE SET mu = $3, sigma = $4, ordinal = $5, star_ratings = $6, games_played = $7",
                    &[
                        &rating.player_id,
                        &rating.attribute.encode(),
                        &rating.mu,
                        &rating.sigma,
                        &rating.ordinal,
                        &star_ratings,
                        &rating.games_played
                    ]
                )
                .await?;
        }

        Ok(())
    }

    /// Difficulty attributes for a (beatmap, normalized mods) combination, if
    /// the performance lookup has produced them.
    pub async fn get_beatmap_difficulty(&self, beatmap_id: i64, mods: u32) -> Result<Option<BeatmapDifficulty>, DbError> {
        let row = self
            .client
            .query_opt(
                "SELECT beatmap_id, mods, aim, speed, slider_factor, bpm, circle_size, approach_rate, star_rating
                 FROM beatmap_difficulties
                 WHERE beatmap_id = $1 AND mods = $2",
                &[&beatmap_id, &(mods as i64)]
            )
            .await?;

        Ok(row.map(|r| BeatmapDifficulty {
            beatmap_id: r.get("beatmap_id"),
            mods: r.get::<_, i64>("mods") as u32,
            aim: r.get("aim"),
            speed: r.get("speed"),
            slider_factor: r.get("slider_factor"),
            bpm: r.get("bpm"),
            circle_size: r.get("circle_size"),
            approach_rate: r.get("approach_rate"),
            star_rating: r.get("star_rating")
        }))
    }

    fn tracked_match_from_row(row: &Row) -> Result<TrackedMatch, DbError> {
        let frame = row
            .get::<_, Option<String>>("frame")
            .map(|json| serde_json::from_str::<MatchFrame>(&json))
            .transpose()?;

        let status = MatchStatus::try_from(row.get::<_, i32>("status")).unwrap_or(MatchStatus::Pending);

        Ok(TrackedMatch {
            match_id: row.get("match_id"),
            cursor: row.get("cursor"),
            status,
            frame,
            last_event_time: row.get("last_event_time")
        })
    }

    fn rating_from_row(row: &Row) -> Result<PlayerRating, DbError> {
        let star_ratings: Vec<f64> = serde_json::from_str(&row.get::<_, String>("star_ratings"))?;
        let attribute_id = row.get::<_, i32>("attribute_id");
        let attribute = RatingAttribute::decode(attribute_id).ok_or(DbError::UnknownAttribute(attribute_id))?;

        Ok(PlayerRating {
            player_id: row.get("player_id"),
            attribute,
            mu: row.get("mu"),
            sigma: row.get("sigma"),
            ordinal: row.get("ordinal"),
            star_ratings,
            games_played: row.get("games_played")
        })
    }
}
