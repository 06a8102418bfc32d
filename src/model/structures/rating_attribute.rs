use crate::model::structures::{
    modification::Modification, scoring_attribute::ScoringAttribute, skillset::Skillset
};
use serde::{Deserialize, Serialize};

const SKILLSET_COUNT: i32 = 8;
const SCORING_COUNT: i32 = 4;

/// The (modification, skillset, scoring attribute) triple a rating is keyed
/// under. `encode` maps the triple onto a contiguous integer id and `decode`
/// inverts it; the two form a bijection so the id can be used as a stable
/// database key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RatingAttribute {
    pub modification: Modification,
    pub skillset: Skillset,
    pub scoring: ScoringAttribute
}

impl RatingAttribute {
    pub fn new(modification: Modification, skillset: Skillset, scoring: ScoringAttribute) -> Self {
        RatingAttribute {
            modification,
            skillset,
            scoring
        }
    }

    pub fn encode(&self) -> i32 {
        (self.modification as i32) * SKILLSET_COUNT * SCORING_COUNT
            + (self.skillset as i32) * SCORING_COUNT
            + self.scoring as i32
    }

    pub fn decode(id: i32) -> Option<RatingAttribute> {
        if id < 0 {
            return None;
        }

        let modification = Modification::try_from(id / (SKILLSET_COUNT * SCORING_COUNT)).ok()?;
        let skillset = Skillset::try_from(id / SCORING_COUNT % SKILLSET_COUNT).ok()?;
        let scoring = ScoringAttribute::try_from(id % SCORING_COUNT).ok()?;

        Some(RatingAttribute {
            modification,
            skillset,
            scoring
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_encode_decode_roundtrip() {
        for modification in Modification::iter() {
            for skillset in Skillset::iter() {
                for scoring in ScoringAttribute::iter() {
                    let attribute = RatingAttribute::new(modification, skillset, scoring);
                    assert_eq!(RatingAttribute::decode(attribute.encode()), Some(attribute));
                }
            }
        }
    }

    #[test]
    fn test_encode_is_injective() {
        let mut seen = std::collections::HashSet::new();
        for modification in Modification::iter() {
            for skillset in Skillset::iter() {
                for scoring in ScoringAttribute::iter() {
                    assert!(seen.insert(RatingAttribute::new(modification, skillset, scoring).encode()));
                }
            }
        }
        assert_eq!(seen.len(), 7 * 8 * 4);
    }

    #[test]
    fn test_decode_out_of_range() {
        assert_eq!(RatingAttribute::decode(-1), None);
        assert_eq!(RatingAttribute::decode(7 * 8 * 4), None);
    }
}
