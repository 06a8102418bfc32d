use crate::{
    api::api_structs::Game,
    database::db_structs::{BeatmapDifficulty, PlayerRating, RatingHistory},
    model::{
        constants::ORDINAL_FACTOR,
        grouping::{group_game, ScoreBucket},
        rating_tracker::{RatingKey, RatingTracker},
        structures::{modification::Modification, rating_attribute::RatingAttribute}
    }
};
use openskill::{
    constant::*,
    model::{model::Model, plackett_luce::PlackettLuce},
    rating::{default_gamma, Rating}
};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CalculationError {
    #[error("rating model returned {got} ratings for {expected} participants")]
    RatingCountMismatch { expected: usize, got: usize }
}

/// The outcome of rating one completed match: the per-attribute deltas and a
/// snapshot of every rating the match touched.
#[derive(Debug)]
pub struct MatchCalculation {
    pub match_id: i64,
    pub histories: Vec<RatingHistory>,
    pub ratings: Vec<PlayerRating>
}

pub struct RatingEngine {
    model: PlackettLuce,
    pub tracker: RatingTracker
}

impl RatingEngine {
    pub fn new(tracker: RatingTracker) -> RatingEngine {
        RatingEngine {
            model: PlackettLuce::new(DEFAULT_BETA, KAPPA, default_gamma),
            tracker
        }
    }

    /// Rates every bucket of every game in one completed match.
    ///
    /// `difficulties` is keyed by (game id, modification); games without an
    /// entry rate under `Overall` only. An error here describes the whole
    /// match: callers record it against the match and move on, it never
    /// aborts sibling matches.
    pub async fn process_match(
        &self,
        match_id: i64,
        games: &[Game],
        difficulties: &HashMap<(i64, Modification), BeatmapDifficulty>
    ) -> Result<MatchCalculation, CalculationError> {
        let mut histories: Vec<RatingHistory> = Vec::new();

        for game in games {
            let per_modification: HashMap<Modification, BeatmapDifficulty> = difficulties
                .iter()
                .filter(|((game_id, _), _)| *game_id == game.id)
                .map(|((_, modification), difficulty)| (*modification, difficulty.clone()))
                .collect();

            let buckets = group_game(game, &per_modification);
            debug!(game_id = game.id, buckets = buckets.len(), "rating game");

            for bucket in &buckets {
                histories.extend(self.apply_bucket(match_id, bucket).await?);
            }
        }

        let mut touched: Vec<RatingKey> = histories
            .iter()
            .map(|h| (h.player_id, h.attribute.encode()))
            .collect();
        touched.sort_unstable();
        touched.dedup();

        let ratings = touched
            .iter()
            .filter_map(|(player_id, attribute_id)| {
                RatingAttribute::decode(*attribute_id).and_then(|a| self.tracker.get(*player_id, a))
            })
            .collect();

        Ok(MatchCalculation {
            match_id,
            histories,
            ratings
        })
    }

    /// Feeds one ranked bucket through the skill model and applies the
    /// resulting (mu, sigma) per participant. All keys are locked up front so
    /// a concurrent match cannot interleave with the read-modify-write.
    async fn apply_bucket(&self, match_id: i64, bucket: &ScoreBucket) -> Result<Vec<RatingHistory>, CalculationError> {
        let attribute = RatingAttribute::new(bucket.modification, bucket.skillset, bucket.scoring);
        let keys: Vec<RatingKey> = bucket
            .entries
            .iter()
            .map(|e| (e.player_id, attribute.encode()))
            .collect();

        let _guards = self.tracker.lock_keys(&keys).await;

        let current: Vec<PlayerRating> = bucket
            .entries
            .iter()
            .map(|e| self.tracker.get_or_create(e.player_id, attribute))
            .collect();

        let teams: Vec<Vec<Rating>> = current
            .iter()
            .map(|r| {
                vec![Rating {
                    mu: r.mu,
                    sigma: r.sigma
                }]
            })
            .collect();
        let placements: Vec<usize> = bucket.entries.iter().map(|e| e.placement).collect();

        let results: Vec<Rating> = self.model.rate(teams, placements).into_iter().flatten().collect();
        if results.len() != current.len() {
            return Err(CalculationError::RatingCountMismatch {
                expected: current.len(),
                got: results.len()
            });
        }

        let mut histories = Vec::with_capacity(current.len());
        for (mut rating, result) in current.into_iter().zip(results) {
            let ordinal_before = rating.ordinal;
            let star_rating_before = rating.star_rating_mean();

            rating.mu = result.mu;
            rating.sigma = result.sigma;
            rating.ordinal = result.mu - ORDINAL_FACTOR * result.sigma;
            if let Some(star_rating) = bucket.star_rating {
                rating.star_ratings.push(star_rating);
            }
            rating.games_played += 1;

            histories.push(RatingHistory {
                player_id: rating.player_id,
                attribute,
                match_id,
                ordinal_before,
                ordinal_after: rating.ordinal,
                star_rating_before,
                star_rating_after: rating.star_rating_mean()
            });

            self.tracker.set(rating);
        }

        Ok(histories)
    }
}
