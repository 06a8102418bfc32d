use crate::{
    database::db_structs::BeatmapDifficulty,
    model::{
        constants::{
            AIM_SPEED_MARGIN, DOUBLE_TIME_RATE, HIGH_AR_THRESHOLD, HIGH_BPM_THRESHOLD, LOW_AR_THRESHOLD,
            PRECISION_CIRCLE_SIZE, TECHNICAL_SLIDER_FACTOR
        },
        structures::{modification::Modification, skillset::Skillset}
    }
};

/// Converts an approach rate to its effective value at a different clock
/// rate, going through the preempt-milliseconds window.
pub fn adjusted_approach_rate(approach_rate: f64, rate: f64) -> f64 {
    let preempt_ms = if approach_rate < 5.0 {
        1200.0 + 600.0 * (5.0 - approach_rate) / 5.0
    } else {
        1200.0 - 750.0 * (approach_rate - 5.0) / 5.0
    };

    let adjusted_ms = preempt_ms / rate;

    if adjusted_ms > 1200.0 {
        5.0 - (adjusted_ms - 1200.0) * 5.0 / 600.0
    } else {
        5.0 + (1200.0 - adjusted_ms) * 5.0 / 750.0
    }
}

fn clock_rate(modification: Modification) -> f64 {
    match modification {
        Modification::DoubleTime => DOUBLE_TIME_RATE,
        _ => 1.0
    }
}

/// Selects the skillsets a score group applies to. `Overall` always applies;
/// the rest require known beatmap difficulty attributes.
pub fn select_skillsets(difficulty: Option<&BeatmapDifficulty>, modification: Modification) -> Vec<Skillset> {
    let mut skillsets = vec![Skillset::Overall];

    let difficulty = match difficulty {
        Some(d) => d,
        None => return skillsets
    };

    let approach_rate = adjusted_approach_rate(difficulty.approach_rate, clock_rate(modification));

    if difficulty.aim > difficulty.speed + AIM_SPEED_MARGIN {
        skillsets.push(Skillset::Aim);
    }
    if difficulty.speed > difficulty.aim + AIM_SPEED_MARGIN {
        skillsets.push(Skillset::Tapping);
    }
    if difficulty.bpm >= HIGH_BPM_THRESHOLD {
        skillsets.push(Skillset::HighBpm);
    }
    if difficulty.slider_factor <= TECHNICAL_SLIDER_FACTOR {
        skillsets.push(Skillset::Technical);
    }
    if difficulty.circle_size >= PRECISION_CIRCLE_SIZE && modification == Modification::HardRock {
        skillsets.push(Skillset::Precision);
    }
    if approach_rate <= LOW_AR_THRESHOLD {
        skillsets.push(Skillset::LowAr);
    }
    if approach_rate >= HIGH_AR_THRESHOLD && modification == Modification::DoubleTime {
        skillsets.push(Skillset::HighAr);
    }

    skillsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn difficulty() -> BeatmapDifficulty {
        BeatmapDifficulty {
            beatmap_id: 1,
            mods: 0,
            aim: 3.0,
            speed: 3.0,
            slider_factor: 1.0,
            bpm: 180.0,
            circle_size: 4.0,
            approach_rate: 9.0,
            star_rating: 6.0
        }
    }

    #[test]
    fn test_unknown_difficulty_is_overall_only() {
        assert_eq!(
            select_skillsets(None, Modification::Nomod),
            vec![Skillset::Overall]
        );
    }

    #[test]
    fn test_aim_requires_strict_margin() {
        let mut d = difficulty();
        d.aim = d.speed + AIM_SPEED_MARGIN;
        assert!(!select_skillsets(Some(&d), Modification::Nomod).contains(&Skillset::Aim));

        d.aim = d.speed + AIM_SPEED_MARGIN + 0.001;
        assert!(select_skillsets(Some(&d), Modification::Nomod).contains(&Skillset::Aim));
    }

    #[test]
    fn test_tapping_requires_strict_margin() {
        let mut d = difficulty();
        d.speed = d.aim + AIM_SPEED_MARGIN;
        assert!(!select_skillsets(Some(&d), Modification::Nomod).contains(&Skillset::Tapping));

        d.speed = d.aim + AIM_SPEED_MARGIN + 0.001;
        assert!(select_skillsets(Some(&d), Modification::Nomod).contains(&Skillset::Tapping));
    }

    #[test]
    fn test_high_bpm_boundary_inclusive() {
        let mut d = difficulty();
        d.bpm = HIGH_BPM_THRESHOLD;
        assert!(select_skillsets(Some(&d), Modification::Nomod).contains(&Skillset::HighBpm));

        d.bpm = HIGH_BPM_THRESHOLD - 0.001;
        assert!(!select_skillsets(Some(&d), Modification::Nomod).contains(&Skillset::HighBpm));
    }

    #[test]
    fn test_technical_boundary_inclusive() {
        let mut d = difficulty();
        d.slider_factor = TECHNICAL_SLIDER_FACTOR;
        assert!(select_skillsets(Some(&d), Modification::Nomod).contains(&Skillset::Technical));

        d.slider_factor = TECHNICAL_SLIDER_FACTOR + 0.001;
        assert!(!select_skillsets(Some(&d), Modification::Nomod).contains(&Skillset::Technical));
    }

    #[test]
    fn test_precision_requires_hard_rock() {
        let mut d = difficulty();
        d.circle_size = PRECISION_CIRCLE_SIZE;
        assert!(select_skillsets(Some(&d), Modification::HardRock).contains(&Skillset::Precision));
        assert!(!select_skillsets(Some(&d), Modification::Nomod).contains(&Skillset::Precision));
    }

    #[test]
    fn test_low_ar_boundary_inclusive() {
        let mut d = difficulty();
        d.approach_rate = LOW_AR_THRESHOLD;
        assert!(select_skillsets(Some(&d), Modification::Nomod).contains(&Skillset::LowAr));

        d.approach_rate = LOW_AR_THRESHOLD + 0.001;
        assert!(!select_skillsets(Some(&d), Modification::Nomod).contains(&Skillset::LowAr));
    }

    #[test]
    fn test_high_ar_requires_double_time() {
        let mut d = difficulty();
        d.approach_rate = 9.0; // ~10.33 at DT rate
        assert!(select_skillsets(Some(&d), Modification::DoubleTime).contains(&Skillset::HighAr));
        assert!(!select_skillsets(Some(&d), Modification::Nomod).contains(&Skillset::HighAr));
    }

    #[test]
    fn test_adjusted_approach_rate() {
        assert_abs_diff_eq!(adjusted_approach_rate(9.0, 1.0), 9.0, epsilon = 1e-9);
        assert_abs_diff_eq!(adjusted_approach_rate(9.0, 1.5), 10.333333333, epsilon = 1e-6);
        assert_abs_diff_eq!(adjusted_approach_rate(5.0, 1.5), 7.666666666, epsilon = 1e-6);
    }
}
