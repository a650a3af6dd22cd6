//! Pregame win probability blending.
//!
//! Each side's score is a fixed-weight sum of four probability-like signals:
//! - Classifier P(win) for the team's recent form (0.80)
//! - Head-to-head rate (0.15)
//! - Home-court baseline as 0.5 ± bump (0.05)
//! - Rest bump as 0.5 ± bump (0.05)
//!
//! The two sums are computed independently and then normalized to percentages
//! summing to 100. The weights are a design choice and are kept exactly.

use crate::classifier::FeatureContribution;
use crate::features::TeamFormSnapshot;
use crate::signals::{home_court_signal, HeadToHead, RestAdjustment, HOME_COURT_BUMP};
use serde::Serialize;

/// Fixed blend weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlendWeights {
    pub model: f64,
    pub h2h: f64,
    pub home_court: f64,
    pub rest: f64,
}

impl BlendWeights {
    pub const STANDARD: BlendWeights = BlendWeights {
        model: 0.80,
        h2h: 0.15,
        home_court: 0.05,
        rest: 0.05,
    };
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Everything the blender consumes for one game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendInputs {
    pub model_home: f64,
    pub model_away: f64,
    pub h2h: HeadToHead,
    pub rest: RestAdjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Probabilities {
    /// Percent, 0-100
    pub home: f64,
    /// Percent, 0-100; home + away = 100
    pub away: f64,
}

impl Probabilities {
    pub const EVEN: Probabilities = Probabilities {
        home: 50.0,
        away: 50.0,
    };

    /// Home wins ties
    pub fn home_favored(&self) -> bool {
        self.home >= self.away
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendOutcome {
    pub home_sum: f64,
    pub away_sum: f64,
    pub probabilities: Probabilities,
    /// Both sums were non-positive and the split fell back to 50/50
    pub degenerate: bool,
}

/// Weighted signal sum for one side
fn side_sum(inputs: &BlendInputs, weights: &BlendWeights, for_home: bool) -> f64 {
    let (model, h2h) = if for_home {
        (inputs.model_home, inputs.h2h.home_rate)
    } else {
        (inputs.model_away, inputs.h2h.away_rate)
    };
    weights.model * model
        + weights.h2h * h2h
        + weights.home_court * home_court_signal(for_home)
        + weights.rest * inputs.rest.signal(for_home)
}

/// Blend both sides and normalize to a percentage pair.
pub fn blend(inputs: &BlendInputs, weights: &BlendWeights) -> BlendOutcome {
    let home_sum = side_sum(inputs, weights, true);
    let away_sum = side_sum(inputs, weights, false);
    let (probabilities, degenerate) = normalize(home_sum, away_sum);
    BlendOutcome {
        home_sum,
        away_sum,
        probabilities,
        degenerate,
    }
}

/// Normalize two non-negative scores to percentages (2 decimals) summing to 100.
///
/// Falls back to an exact 50/50 when both scores are ≤ 0.
pub fn normalize(home_sum: f64, away_sum: f64) -> (Probabilities, bool) {
    let total = home_sum + away_sum;
    if (home_sum <= 0.0 && away_sum <= 0.0) || !total.is_finite() || total <= 0.0 {
        return (Probabilities::EVEN, true);
    }
    let home = round2(home_sum / total * 100.0);
    let away = round2(100.0 - home);
    (Probabilities { home, away }, false)
}

#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// ============================================================================
// Response
// ============================================================================

/// Explanatory metadata attached to a game prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explain {
    pub weights: BlendWeights,
    pub home_court_bump: f64,
    pub h2h_home: Option<f64>,
    pub h2h_away: Option<f64>,
    pub h2h_meetings: Option<usize>,
    pub home_rest_days: Option<i64>,
    pub away_rest_days: Option<i64>,
    pub rest_diff: Option<i64>,
    pub rest_bump: Option<f64>,
    pub model_home: Option<f64>,
    pub model_away: Option<f64>,
    pub home_form: Option<TeamFormSnapshot>,
    pub away_form: Option<TeamFormSnapshot>,
    pub home_contributions: Vec<FeatureContribution>,
    pub away_contributions: Vec<FeatureContribution>,
    pub intercept: Option<f64>,
    /// Set when the response is a fallback or a signal degraded
    pub reason: Option<String>,
}

impl Explain {
    /// Metadata for a forced 50/50 response
    pub fn fallback(reason: String) -> Self {
        Self {
            weights: BlendWeights::STANDARD,
            home_court_bump: HOME_COURT_BUMP,
            h2h_home: None,
            h2h_away: None,
            h2h_meetings: None,
            home_rest_days: None,
            away_rest_days: None,
            rest_diff: None,
            rest_bump: None,
            model_home: None,
            model_away: None,
            home_form: None,
            away_form: None,
            home_contributions: Vec::new(),
            away_contributions: Vec::new(),
            intercept: None,
            reason: Some(reason),
        }
    }
}

/// Game prediction as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub game_id: String,
    /// "<TeamName> wins"
    pub prediction: String,
    pub predicted_winner: String,
    pub home_name: String,
    pub away_name: String,
    pub home_abbr: String,
    pub away_abbr: String,
    pub probabilities: Probabilities,
    /// Classifier in-sample accuracy (0-1); null when the classifier is unavailable
    pub accuracy: Option<f64>,
    pub explain: Explain,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inputs(model_home: f64, model_away: f64, h2h_home: f64, rest_diff: i64) -> BlendInputs {
        BlendInputs {
            model_home,
            model_away,
            h2h: HeadToHead {
                home_rate: h2h_home,
                away_rate: 1.0 - h2h_home,
                meetings: 6,
            },
            rest: RestAdjustment::from_days(rest_diff.max(0), (-rest_diff).max(0)),
        }
    }

    #[test]
    fn test_neutral_inputs_favor_home_only_by_court() {
        let outcome = blend(&inputs(0.5, 0.5, 0.5, 0), &BlendWeights::STANDARD);
        // home: 0.4 + 0.075 + 0.0275 + 0.025 = 0.5275; away: 0.4 + 0.075 + 0.0225 + 0.025 = 0.5225
        assert!((outcome.home_sum - 0.5275).abs() < 1e-12);
        assert!((outcome.away_sum - 0.5225).abs() < 1e-12);
        assert_eq!(outcome.probabilities.home, 50.24);
        assert_eq!(outcome.probabilities.away, 49.76);
        assert!(!outcome.degenerate);
    }

    #[test]
    fn test_worked_example() {
        let outcome = blend(&inputs(0.7, 0.4, 4.0 / 6.0, 2), &BlendWeights::STANDARD);
        let home = 0.8 * 0.7 + 0.15 * (4.0 / 6.0) + 0.05 * 0.55 + 0.05 * 0.54;
        let away = 0.8 * 0.4 + 0.15 * (2.0 / 6.0) + 0.05 * 0.45 + 0.05 * 0.46;
        assert!((outcome.home_sum - home).abs() < 1e-12);
        assert!((outcome.away_sum - away).abs() < 1e-12);
        let expected_home = ((home / (home + away)) * 10000.0).round() / 100.0;
        assert_eq!(outcome.probabilities.home, expected_home);
        assert!(outcome.probabilities.home_favored());
    }

    #[test]
    fn test_degenerate_sums_fall_back_to_even() {
        let (probs, degenerate) = normalize(0.0, 0.0);
        assert_eq!(probs, Probabilities::EVEN);
        assert!(degenerate);
        let (probs, degenerate) = normalize(-0.2, -0.1);
        assert_eq!(probs, Probabilities::EVEN);
        assert!(degenerate);
    }

    #[test]
    fn test_home_wins_ties() {
        assert!(Probabilities::EVEN.home_favored());
        let (probs, _) = normalize(0.3, 0.3);
        assert_eq!(probs, Probabilities::EVEN);
        assert!(probs.home_favored());
    }

    #[test]
    fn test_weights_serialize_with_expected_keys() {
        let json = serde_json::to_value(BlendWeights::STANDARD).unwrap();
        assert_eq!(json["model"], 0.8);
        assert_eq!(json["h2h"], 0.15);
        assert_eq!(json["home_court"], 0.05);
        assert_eq!(json["rest"], 0.05);
    }

    proptest! {
        #[test]
        fn prop_percentages_sum_to_100(
            model_home in 0.0f64..=1.0,
            model_away in 0.0f64..=1.0,
            h2h in 0.0f64..=1.0,
            rest_diff in -10i64..=10,
        ) {
            let outcome = blend(&inputs(model_home, model_away, h2h, rest_diff), &BlendWeights::STANDARD);
            let p = outcome.probabilities;
            prop_assert!((p.home + p.away - 100.0).abs() < 1e-9);
            prop_assert!(p.home >= 0.0 && p.home <= 100.0);
        }

        #[test]
        fn prop_blend_is_deterministic(
            model_home in 0.0f64..=1.0,
            model_away in 0.0f64..=1.0,
        ) {
            let i = inputs(model_home, model_away, 0.5, 1);
            let a = blend(&i, &BlendWeights::STANDARD);
            let b = blend(&i, &BlendWeights::STANDARD);
            prop_assert_eq!(a.probabilities.home.to_bits(), b.probabilities.home.to_bits());
            prop_assert_eq!(a.probabilities.away.to_bits(), b.probabilities.away.to_bits());
        }
    }
}
