use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::EnumIter;

/// Criterion used to rank the scores of one group before a rating update.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, PartialOrd, Ord)]
#[repr(u8)]
pub enum ScoringAttribute {
    Score = 0,
    Combo = 1,
    Accuracy = 2,
    PerformancePoints = 3
}

impl TryFrom<i32> for ScoringAttribute {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ScoringAttribute::Score),
            1 => Ok(ScoringAttribute::Combo),
            2 => Ok(ScoringAttribute::Accuracy),
            3 => Ok(ScoringAttribute::PerformancePoints),
            _ => Err(())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::structures::scoring_attribute::ScoringAttribute;

    #[test]
    fn test_convert() {
        assert_eq!(ScoringAttribute::try_from(0), Ok(ScoringAttribute::Score));
        assert_eq!(ScoringAttribute::try_from(3), Ok(ScoringAttribute::PerformancePoints));
        assert_eq!(ScoringAttribute::try_from(4), Err(()));
    }
}
