use crate::model::structures::{modification::Modification, mods};

/// Classifies a raw score bitmask into exactly one modification bucket, or
/// `None` when the normalized combination is not rated.
///
/// Precedence after stripping cosmetic mods: HD+FL, then any EZ combination,
/// then the DT family (DT, HDDT), then the HR family (HR, HDHR), then bare
/// HD, then no mods at all.
pub fn classify(raw_mods: u32) -> Option<Modification> {
    let remaining = mods::normalize(raw_mods);

    if remaining == mods::HIDDEN | mods::FLASHLIGHT {
        return Some(Modification::Flashlight);
    }
    if remaining & mods::EASY != 0 {
        return Some(Modification::Easy);
    }
    if remaining & mods::DOUBLE_TIME != 0 && remaining & !(mods::DOUBLE_TIME | mods::HIDDEN) == 0 {
        return Some(Modification::DoubleTime);
    }
    if remaining & mods::HARD_ROCK != 0 && remaining & !(mods::HARD_ROCK | mods::HIDDEN) == 0 {
        return Some(Modification::HardRock);
    }
    if remaining == mods::HIDDEN {
        return Some(Modification::Hidden);
    }
    if remaining == 0 {
        return Some(Modification::Nomod);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nomod() {
        assert_eq!(classify(0), Some(Modification::Nomod));
        assert_eq!(classify(mods::NO_FAIL | mods::SCORE_V2), Some(Modification::Nomod));
    }

    #[test]
    fn test_hidden_flashlight_wins_over_hidden() {
        assert_eq!(classify(mods::HIDDEN | mods::FLASHLIGHT), Some(Modification::Flashlight));
        assert_eq!(classify(mods::HIDDEN), Some(Modification::Hidden));
    }

    #[test]
    fn test_easy_present() {
        assert_eq!(classify(mods::EASY), Some(Modification::Easy));
        assert_eq!(classify(mods::EASY | mods::DOUBLE_TIME), Some(Modification::Easy));
        assert_eq!(classify(mods::EASY | mods::HIDDEN), Some(Modification::Easy));
    }

    #[test]
    fn test_double_time_family() {
        assert_eq!(classify(mods::DOUBLE_TIME), Some(Modification::DoubleTime));
        assert_eq!(classify(mods::HIDDEN | mods::DOUBLE_TIME), Some(Modification::DoubleTime));
        assert_eq!(
            classify(mods::NIGHTCORE | mods::DOUBLE_TIME),
            Some(Modification::DoubleTime)
        );
    }

    #[test]
    fn test_hard_rock_family() {
        assert_eq!(classify(mods::HARD_ROCK), Some(Modification::HardRock));
        assert_eq!(classify(mods::HIDDEN | mods::HARD_ROCK), Some(Modification::HardRock));
    }

    #[test]
    fn test_unclassified_combinations() {
        assert_eq!(classify(mods::FLASHLIGHT), None);
        assert_eq!(classify(mods::HALF_TIME), None);
        assert_eq!(classify(mods::HARD_ROCK | mods::DOUBLE_TIME), None);
        assert_eq!(classify(mods::RELAX), None);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let raw = mods::HIDDEN | mods::DOUBLE_TIME | mods::NO_FAIL;
        let first = classify(raw);
        for _ in 0..10 {
            assert_eq!(classify(raw), first);
        }
    }
}
