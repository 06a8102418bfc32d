use crate::{
    api::{
        api_structs::{Game, MatchFrame},
        OsuApi
    },
    database::{
        db::DbClient,
        db_structs::{BeatmapDifficulty, MatchStatus, TrackedMatch}
    },
    ingestion::{fetcher::FrameSequence, merge::merge, stall::is_stalled, IngestError},
    messaging::{MatchCalculatedMessage, PlayerHistory, RabbitMqPublisher, RatingChange},
    model::{
        grouping::game_modifications,
        rating_engine::{MatchCalculation, RatingEngine},
        structures::modification::Modification
    },
    utils::progress_utils::progress_bar
};
use chrono::Utc;
use futures::{stream, StreamExt};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Drives every tracked match through one poll pass: discovery, incremental
/// frame ingestion, stall demotion and, once a match has ended, the rating
/// calculation and its publication.
///
/// Matches are processed with bounded concurrency; inside one match the frame
/// pulls stay strictly sequential so the cursor and the stored snapshot can
/// never race each other.
pub struct IngestionWorker {
    api: Arc<OsuApi>,
    db: DbClient,
    engine: Arc<RatingEngine>,
    publisher: Option<Arc<RabbitMqPublisher>>,
    shutdown: watch::Receiver<bool>,
    poll_concurrency: usize
}

impl IngestionWorker {
    pub fn new(
        api: Arc<OsuApi>,
        db: DbClient,
        engine: Arc<RatingEngine>,
        publisher: Option<Arc<RabbitMqPublisher>>,
        shutdown: watch::Receiver<bool>,
        poll_concurrency: usize
    ) -> IngestionWorker {
        IngestionWorker {
            api,
            db,
            engine,
            publisher,
            shutdown,
            poll_concurrency: poll_concurrency.max(1)
        }
    }

    /// One full pass: register newly listed matches, then poll every match
    /// that is still pending or mid-ingestion. A single match failing is
    /// flagged against that match; its siblings are unaffected.
    pub async fn run_batch(&self) -> Result<(), IngestError> {
        if let Err(e) = self.discover_matches().await {
            warn!("match discovery failed, continuing with known matches: {e}");
        }

        let tracked = self
            .db
            .get_matches_by_status(&[MatchStatus::Pending, MatchStatus::Ingesting])
            .await?;

        if tracked.is_empty() {
            return Ok(());
        }

        info!(matches = tracked.len(), "polling tracked matches");
        let bar = progress_bar(tracked.len() as u64);

        let results: Vec<(i64, Result<(), IngestError>)> = stream::iter(tracked)
            .map(|tracked_match| {
                let match_id = tracked_match.match_id;
                let bar = bar.clone();
                async move {
                    let result = self.poll_match(tracked_match).await;
                    bar.inc(1);
                    (match_id, result)
                }
            })
            .buffer_unordered(self.poll_concurrency)
            .collect()
            .await;

        bar.finish_and_clear();

        for (match_id, result) in results {
            if let Err(e) = result {
                if halts_ingestion(&e) {
                    error!(match_id, "match ingestion halted: {e}");
                    if let Err(db_err) = self.db.flag_match_error(match_id, &e.to_string()).await {
                        warn!(match_id, "failed to record match error: {db_err}");
                    }
                } else {
                    warn!(match_id, "match poll failed, retrying next batch: {e}");
                }
            }
        }

        Ok(())
    }

    /// Walks the paginated match listing forward from the highest known id,
    /// registering every match it has not seen before.
    async fn discover_matches(&self) -> Result<usize, IngestError> {
        let mut cursor = self.db.get_last_match_id().await?;
        let mut registered = 0usize;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let page = self.api.list_matches(cursor).await?;
            if page.matches.is_empty() {
                break;
            }

            for summary in &page.matches {
                self.db.register_match(summary.id).await?;
                registered += 1;
            }

            match page.cursor {
                Some(next) => cursor = next.match_id,
                None => break
            }
        }

        if registered > 0 {
            info!(registered, "registered newly discovered matches");
        }

        Ok(registered)
    }

    /// Pulls frames for one match until its backlog is drained, persisting
    /// the merged snapshot and advanced cursor after every full merge. On
    /// match end the snapshot is handed to the rating engine; otherwise a
    /// long-silent match is demoted to stalled.
    async fn poll_match(&self, tracked: TrackedMatch) -> Result<(), IngestError> {
        let match_id = tracked.match_id;
        let mut snapshot = tracked.frame;
        let mut last_event_time = tracked.last_event_time;
        let mut sequence = FrameSequence::new(&self.api, match_id, tracked.cursor);
        let mut shutdown = self.shutdown.clone();

        loop {
            let step = tokio::select! {
                _ = shutdown.changed() => {
                    info!(match_id, "shutdown requested, abandoning poll");
                    return Ok(());
                }
                step = sequence.next() => step
            };

            let Some(step) = step else { break };
            let step = step?;

            let merged = match &snapshot {
                Some(before) => merge(before, &step.frame),
                None => step.frame
            };

            if step.last_event_time.is_some() {
                last_event_time = step.last_event_time;
            }

            self.db
                .save_match_state(match_id, &merged, step.cursor, last_event_time)
                .await?;
            snapshot = Some(merged);
        }

        let Some(frame) = snapshot else {
            // Nothing fetched yet; leave the match pending for the next pass.
            return Ok(());
        };

        if frame.ended() {
            self.calculate(match_id, &frame).await?;
        } else if let Some(last) = last_event_time {
            if is_stalled(last, Utc::now().fixed_offset()) {
                info!(match_id, "no events within the stall threshold, marking stalled");
                self.db.set_match_status(match_id, MatchStatus::Stalled).await?;
            }
        }

        Ok(())
    }

    /// Rates one ended match. A calculation failure is recorded against the
    /// match and does not propagate.
    async fn calculate(&self, match_id: i64, frame: &MatchFrame) -> Result<(), IngestError> {
        let games = completed_games(frame);
        let difficulties = self.prefetch_difficulties(&games).await?;

        match self.engine.process_match(match_id, &games, &difficulties).await {
            Ok(calculation) => {
                info!(
                    match_id,
                    ratings = calculation.ratings.len(),
                    "match calculated, persisting ratings"
                );
                self.db.upsert_ratings(&calculation.ratings).await?;
                self.db.set_match_status(match_id, MatchStatus::Calculated).await?;
                self.publish(frame, calculation).await;
            }
            Err(e) => {
                error!(match_id, "rating calculation failed: {e}");
                self.db.flag_match_error(match_id, &e.to_string()).await?;
            }
        }

        Ok(())
    }

    /// Loads the difficulty attributes for every (game, modification) pair
    /// the match rated under. Missing rows simply restrict that game to
    /// `Overall`.
    async fn prefetch_difficulties(
        &self,
        games: &[Game]
    ) -> Result<HashMap<(i64, Modification), BeatmapDifficulty>, IngestError> {
        let mut difficulties = HashMap::new();

        for game in games {
            for modification in game_modifications(game) {
                if let Some(difficulty) = self
                    .db
                    .get_beatmap_difficulty(game.beatmap_id, modification.bits())
                    .await?
                {
                    difficulties.insert((game.id, modification), difficulty);
                }
            }
        }

        Ok(difficulties)
    }

    async fn publish(&self, frame: &MatchFrame, calculation: MatchCalculation) {
        let Some(publisher) = &self.publisher else { return };

        let rating_changes: Vec<RatingChange> = calculation
            .histories
            .iter()
            .map(|h| RatingChange {
                player_id: h.player_id,
                attribute_id: h.attribute.encode(),
                ordinal_before: h.ordinal_before,
                ordinal_after: h.ordinal_after,
                star_rating_before: h.star_rating_before,
                star_rating_after: h.star_rating_after
            })
            .collect();

        let mut per_player: HashMap<i64, i32> = HashMap::new();
        for history in &calculation.histories {
            *per_player.entry(history.player_id).or_insert(0) += 1;
        }

        let mut player_histories: Vec<PlayerHistory> = per_player
            .into_iter()
            .map(|(player_id, attributes_updated)| PlayerHistory {
                player_id,
                attributes_updated
            })
            .collect();
        player_histories.sort_by_key(|h| h.player_id);

        let message = MatchCalculatedMessage {
            match_id: calculation.match_id,
            match_name: frame.info.name.clone(),
            ended_at: frame.info.end_time,
            rating_changes,
            player_histories,
            processed_at: Utc::now(),
            correlation_id: None
        };

        if let Err(e) = publisher.publish_match_calculated(message).await {
            warn!(match_id = calculation.match_id, "failed to publish match calculated event: {e}");
        }
    }
}

/// Whether an ingestion error permanently abandons its match.
///
/// Transport, deserialization and database failures are transient: the
/// cursor never advanced past the failed window, so the next batch retries
/// the same fetch. Only a cursor regression halts the match for good.
fn halts_ingestion(error: &IngestError) -> bool {
    matches!(error, IngestError::CursorRegression { .. })
}

/// The games embedded in a frame's events, excluding any still in progress.
pub fn completed_games(frame: &MatchFrame) -> Vec<Game> {
    frame
        .events
        .iter()
        .filter_map(|e| e.game.clone())
        .filter(|g| frame.current_game_id != Some(g.id))
        .collect()
}
