use crate::{
    api::api_structs::{Game, GameScore},
    database::db_structs::BeatmapDifficulty,
    model::{
        classification::classify,
        ranking::{rank, RankedScore},
        skillsets::select_skillsets,
        structures::{modification::Modification, scoring_attribute::ScoringAttribute, skillset::Skillset}
    }
};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use strum::IntoEnumIterator;

/// The unit of rating-update work: one ranked score list tagged with the
/// (modification, skillset, scoring attribute) triple it applies to.
#[derive(Debug, Clone)]
pub struct ScoreBucket {
    pub modification: Modification,
    pub skillset: Skillset,
    pub scoring: ScoringAttribute,
    pub entries: Vec<RankedScore>,
    pub star_rating: Option<f64>
}

/// The distinct modification buckets present among a game's scores, in score
/// order. Used to prefetch beatmap difficulty per modification.
pub fn game_modifications(game: &Game) -> Vec<Modification> {
    let mut seen = HashSet::new();
    let mut modifications = Vec::new();

    for score in &game.scores {
        if let Some(modification) = classify(score.mods) {
            if seen.insert(modification) {
                modifications.push(modification);
            }
        }
    }

    modifications
}

/// Splits one game's scores into ranked buckets.
///
/// Scores are grouped by normalized modification; unclassified combinations
/// are excluded. Each group with at least two distinct participants emits,
/// per scoring attribute and applicable skillset, one bucket under its own
/// modification and one under `AllMods`.
pub fn group_game(game: &Game, difficulties: &HashMap<Modification, BeatmapDifficulty>) -> Vec<ScoreBucket> {
    let mut groups: IndexMap<Modification, Vec<&GameScore>> = IndexMap::new();

    for score in &game.scores {
        if let Some(modification) = classify(score.mods) {
            groups.entry(modification).or_default().push(score);
        }
    }

    let mut buckets = Vec::new();

    for (modification, scores) in groups {
        let distinct_players: HashSet<i64> = scores.iter().map(|s| s.user_id).collect();
        if distinct_players.len() < 2 {
            continue;
        }

        let difficulty = difficulties.get(&modification);
        let skillsets = select_skillsets(difficulty, modification);
        let star_rating = difficulty.map(|d| d.star_rating);

        for scoring in ScoringAttribute::iter() {
            let entries = rank(&scores, scoring);

            for skillset in &skillsets {
                for tag in [modification, Modification::AllMods] {
                    buckets.push(ScoreBucket {
                        modification: tag,
                        skillset: *skillset,
                        scoring,
                        entries: entries.clone(),
                        star_rating
                    });
                }
            }
        }
    }

    buckets
}
