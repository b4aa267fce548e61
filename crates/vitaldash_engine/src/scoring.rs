//! Metric normalizer: converts raw physiological and behavioral metrics
//! into bounded 0-100 sub-scores using fixed piecewise bands.
//!
//! Every function here is pure and total. Missing inputs resolve to the
//! documented neutral defaults; out-of-domain numerics are not range-checked
//! here, validation belongs to the record owners upstream.

/// Weight sub-score, driven by BMI bands with the weight reading acting as a
/// presence check. Either input missing yields the neutral 70.
pub fn weight_score(weight: Option<f64>, bmi: Option<f64>) -> u8 {
    let (Some(_), Some(bmi)) = (weight, bmi) else {
        return 70;
    };
    if (18.5..25.0).contains(&bmi) {
        100
    } else if (25.0..30.0).contains(&bmi) {
        80
    } else if bmi >= 30.0 {
        60
    } else {
        70
    }
}

/// BMI sub-score. Missing yields the neutral 70.
pub fn bmi_score(bmi: Option<f64>) -> u8 {
    let Some(bmi) = bmi else {
        return 70;
    };
    if (18.5..25.0).contains(&bmi) {
        100
    } else if (17.0..18.5).contains(&bmi) {
        80
    } else if (25.0..30.0).contains(&bmi) {
        75
    } else {
        50
    }
}

/// Age sub-score: monotonic step function, no interpolation.
pub fn age_score(age: Option<u32>) -> u8 {
    match age {
        Some(age) if age <= 25 => 90,
        Some(age) if age <= 35 => 85,
        Some(age) if age <= 45 => 80,
        Some(age) if age <= 55 => 75,
        _ => 70,
    }
}

/// Activity sub-score from the fixed level lookup. Unknown keys score the
/// documented default of 60, never an error.
pub fn activity_score(level: &str) -> u8 {
    match level {
        "sedentary" => 40,
        "lightly_active" => 60,
        "moderately_active" => 80,
        "very_active" => 90,
        "extremely_active" => 100,
        _ => 60,
    }
}

/// Height does not materially change, so its axis is a fixed placeholder.
pub fn height_score() -> u8 {
    85
}

/// Fold the five sub-scores into the overall score: unweighted rounded mean,
/// no clamping (inputs are already 0-100 by construction).
pub fn combine_overall(nutrition: u8, exercise: u8, hydration: u8, sleep: u8, weight: u8) -> u8 {
    let sum = u32::from(nutrition)
        + u32::from(exercise)
        + u32::from(hydration)
        + u32::from(sleep)
        + u32::from(weight);
    (f64::from(sum) / 5.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_score_bands() {
        assert_eq!(weight_score(Some(70.0), Some(23.0)), 100);
        assert_eq!(weight_score(Some(80.0), Some(27.5)), 80);
        assert_eq!(weight_score(Some(95.0), Some(31.0)), 60);
        assert_eq!(weight_score(Some(50.0), Some(17.0)), 70);
    }

    #[test]
    fn weight_score_missing_inputs_are_neutral() {
        assert_eq!(weight_score(None, Some(23.0)), 70);
        assert_eq!(weight_score(Some(70.0), None), 70);
        assert_eq!(weight_score(None, None), 70);
    }

    #[test]
    fn bmi_score_bands() {
        assert_eq!(bmi_score(Some(23.0)), 100);
        assert_eq!(bmi_score(Some(17.5)), 80);
        assert_eq!(bmi_score(Some(27.0)), 75);
        assert_eq!(bmi_score(Some(31.0)), 50);
        assert_eq!(bmi_score(Some(15.0)), 50);
        assert_eq!(bmi_score(None), 70);
    }

    #[test]
    fn bmi_score_band_edges() {
        assert_eq!(bmi_score(Some(18.5)), 100);
        assert_eq!(bmi_score(Some(24.9)), 100);
        assert_eq!(bmi_score(Some(25.0)), 75);
        assert_eq!(bmi_score(Some(17.0)), 80);
    }

    #[test]
    fn bmi_score_is_bounded_and_monotonic_toward_healthy() {
        // Walking BMI down from 30 toward 21 must never lower the score.
        let mut previous = 0u8;
        let mut bmi = 30.0;
        while bmi >= 21.0 {
            let score = bmi_score(Some(bmi));
            assert!((50..=100).contains(&score));
            assert!(score >= previous);
            previous = score;
            bmi -= 0.5;
        }
    }

    #[test]
    fn age_score_steps() {
        assert_eq!(age_score(Some(25)), 90);
        assert_eq!(age_score(Some(35)), 85);
        assert_eq!(age_score(Some(45)), 80);
        assert_eq!(age_score(Some(55)), 75);
        assert_eq!(age_score(Some(70)), 70);
        assert_eq!(age_score(None), 70);
    }

    #[test]
    fn activity_score_lookup() {
        assert_eq!(activity_score("sedentary"), 40);
        assert_eq!(activity_score("lightly_active"), 60);
        assert_eq!(activity_score("moderately_active"), 80);
        assert_eq!(activity_score("very_active"), 90);
        assert_eq!(activity_score("extremely_active"), 100);
        assert_eq!(activity_score("unknown_level"), 60);
        assert_eq!(activity_score("moderate"), 60);
    }

    #[test]
    fn combine_overall_is_rounded_mean() {
        assert_eq!(combine_overall(70, 70, 70, 70, 70), 70);
        assert_eq!(combine_overall(100, 80, 60, 90, 70), 80);
        // 71 + 71 + 71 + 71 + 72 = 356, mean 71.2 -> 71
        assert_eq!(combine_overall(71, 71, 71, 71, 72), 71);
        // 71 + 71 + 71 + 72 + 72 = 357, mean 71.4 -> 71
        assert_eq!(combine_overall(71, 71, 71, 72, 72), 71);
        // 357 + 1 = 358, mean 71.6 -> 72
        assert_eq!(combine_overall(71, 71, 72, 72, 72), 72);
    }

    #[test]
    fn combine_overall_is_idempotent() {
        let overall = combine_overall(90, 85, 70, 75, 100);
        assert_eq!(
            combine_overall(overall, overall, overall, overall, overall),
            overall
        );
    }
}
