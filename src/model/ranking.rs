use crate::{api::api_structs::GameScore, model::structures::scoring_attribute::ScoringAttribute};

/// A score reduced to its placement within one ranked group. Placements use
/// competition ranking: tied entries share a placement and the next distinct
/// entry skips past them.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedScore {
    pub player_id: i64,
    pub placement: usize
}

fn sort_key(score: &GameScore, attribute: ScoringAttribute) -> Option<f64> {
    match attribute {
        ScoringAttribute::Score => Some(score.score as f64),
        ScoringAttribute::Combo => Some(score.max_combo as f64),
        ScoringAttribute::Accuracy => Some(score.accuracy),
        ScoringAttribute::PerformancePoints => score.pp
    }
}

/// Orders a score group by the given attribute and assigns placements.
///
/// Score, combo and accuracy rank descending; performance points preserve the
/// input order, which is treated as already rank-ordered upstream.
pub fn rank(scores: &[&GameScore], attribute: ScoringAttribute) -> Vec<RankedScore> {
    let mut ordered: Vec<&GameScore> = scores.to_vec();

    if attribute != ScoringAttribute::PerformancePoints {
        ordered.sort_by(|a, b| {
            sort_key(b, attribute)
                .partial_cmp(&sort_key(a, attribute))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    let mut ranked = Vec::with_capacity(ordered.len());
    let mut previous_key: Option<f64> = None;
    let mut placement = 0;

    for (i, score) in ordered.iter().enumerate() {
        let key = sort_key(score, attribute);
        let tied = key.is_some() && key == previous_key;
        if !tied {
            placement = i + 1;
        }
        previous_key = key;

        ranked.push(RankedScore {
            player_id: score.user_id,
            placement
        });
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::generate_score;

    #[test]
    fn test_rank_by_score_descending() {
        let scores = vec![
            generate_score(1, 1000, 100, 0.95, 0),
            generate_score(2, 2000, 100, 0.95, 0),
            generate_score(3, 1500, 100, 0.95, 0),
            generate_score(4, 500, 100, 0.95, 0),
        ];
        let refs: Vec<&GameScore> = scores.iter().collect();

        let ranked = rank(&refs, ScoringAttribute::Score);

        let players: Vec<i64> = ranked.iter().map(|r| r.player_id).collect();
        assert_eq!(players, vec![2, 3, 1, 4]);
        assert_eq!(
            ranked.iter().map(|r| r.placement).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn test_rank_by_combo() {
        let scores = vec![
            generate_score(1, 100, 250, 0.9, 0),
            generate_score(2, 200, 400, 0.8, 0),
        ];
        let refs: Vec<&GameScore> = scores.iter().collect();

        let ranked = rank(&refs, ScoringAttribute::Combo);
        assert_eq!(ranked[0].player_id, 2);
        assert_eq!(ranked[1].player_id, 1);
    }

    #[test]
    fn test_rank_by_accuracy() {
        let scores = vec![
            generate_score(1, 100, 250, 0.91, 0),
            generate_score(2, 200, 400, 0.99, 0),
        ];
        let refs: Vec<&GameScore> = scores.iter().collect();

        let ranked = rank(&refs, ScoringAttribute::Accuracy);
        assert_eq!(ranked[0].player_id, 2);
    }

    #[test]
    fn test_ties_share_placement() {
        let scores = vec![
            generate_score(1, 2000, 100, 0.95, 0),
            generate_score(2, 1000, 100, 0.95, 0),
            generate_score(3, 1000, 100, 0.95, 0),
            generate_score(4, 500, 100, 0.95, 0),
        ];
        let refs: Vec<&GameScore> = scores.iter().collect();

        let ranked = rank(&refs, ScoringAttribute::Score);
        assert_eq!(
            ranked.iter().map(|r| r.placement).collect::<Vec<_>>(),
            vec![1, 2, 2, 4]
        );
    }

    #[test]
    fn test_performance_points_preserve_input_order() {
        let mut first = generate_score(1, 100, 100, 0.9, 0);
        let mut second = generate_score(2, 9000, 900, 0.99, 0);
        first.pp = Some(400.0);
        second.pp = Some(200.0);

        let scores = vec![first, second];
        let refs: Vec<&GameScore> = scores.iter().collect();

        let ranked = rank(&refs, ScoringAttribute::PerformancePoints);
        assert_eq!(ranked[0].player_id, 1);
        assert_eq!(ranked[1].player_id, 2);
        assert_eq!(ranked[1].placement, 2);
    }

    #[test]
    fn test_performance_points_missing_values_never_tie() {
        let scores = vec![
            generate_score(1, 100, 100, 0.9, 0),
            generate_score(2, 200, 200, 0.9, 0),
        ];
        let refs: Vec<&GameScore> = scores.iter().collect();

        let ranked = rank(&refs, ScoringAttribute::PerformancePoints);
        assert_eq!(
            ranked.iter().map(|r| r.placement).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }
}
