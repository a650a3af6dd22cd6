//! Player threshold predictor.
//!
//! Fits a Gaussian to a player's recent games against one opponent and reports
//! P(stat > threshold) and its complement for fixed thresholds per category.
//! Independent of the team classifier.

pub mod matchup;

use crate::models::PlayerGameLog;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::BTreeMap;

pub use matchup::{opponent_code, parse_matchup, Matchup};

/// Most recent games against the opponent used for the fit
pub const PLAYER_WINDOW: usize = 5;

/// Standard deviation used when the observed spread is zero
pub const STD_DEV_FLOOR: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatCategory {
    Points,
    ThreesMade,
    Rebounds,
    Assists,
    Turnovers,
}

impl StatCategory {
    pub const TRACKED: [StatCategory; 5] = [
        StatCategory::Points,
        StatCategory::ThreesMade,
        StatCategory::Rebounds,
        StatCategory::Assists,
        StatCategory::Turnovers,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatCategory::Points => "PTS",
            StatCategory::ThreesMade => "3PM",
            StatCategory::Rebounds => "REB",
            StatCategory::Assists => "AST",
            StatCategory::Turnovers => "TOV",
        }
    }

    pub fn thresholds(&self) -> [f64; 3] {
        match self {
            StatCategory::Points => [10.0, 20.0, 30.0],
            StatCategory::ThreesMade => [1.0, 2.0, 3.0],
            StatCategory::Rebounds => [5.0, 8.0, 10.0],
            StatCategory::Assists => [3.0, 5.0, 8.0],
            StatCategory::Turnovers => [1.0, 2.0, 3.0],
        }
    }

    pub fn value(&self, log: &PlayerGameLog) -> f64 {
        match self {
            StatCategory::Points => log.points,
            StatCategory::ThreesMade => log.fg3_made,
            StatCategory::Rebounds => log.rebounds,
            StatCategory::Assists => log.assists,
            StatCategory::Turnovers => log.turnovers,
        }
    }
}

/// A probability in percent, or the "No data" marker
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LineProbability {
    Percent(f64),
    NoData(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdLine {
    /// "Over 20", "Under 20" or "N/A"
    pub condition: String,
    pub prob: LineProbability,
}

impl ThresholdLine {
    pub fn unavailable() -> Self {
        Self {
            condition: "N/A".to_string(),
            prob: LineProbability::NoData("No data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaussianFit {
    pub mean: f64,
    pub std_dev: f64,
    pub samples: usize,
}

impl GaussianFit {
    /// Sample mean and sample standard deviation; a zero (or undefined)
    /// deviation is floored to [`STD_DEV_FLOOR`].
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if values.len() > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Some(Self {
            mean,
            std_dev: if std_dev > 0.0 { std_dev } else { STD_DEV_FLOOR },
            samples: values.len(),
        })
    }

    /// P(value > threshold) = 1 - Φ(threshold; mean, std_dev)
    pub fn prob_over(&self, threshold: f64) -> f64 {
        match Normal::new(self.mean, self.std_dev) {
            Ok(normal) => 1.0 - normal.cdf(threshold),
            Err(_) => 0.5,
        }
    }
}

/// Up to [`PLAYER_WINDOW`] most recent games against `opponent`, any season type.
pub fn recent_vs_opponent<'a>(logs: &'a [PlayerGameLog], opponent: &str) -> Vec<&'a PlayerGameLog> {
    let opponent = crate::league_config::normalize_code(opponent);
    let mut games: Vec<&PlayerGameLog> = logs
        .iter()
        .filter(|log| opponent_code(&log.matchup).as_deref() == Some(opponent.as_str()))
        .collect();
    games.sort_by(|a, b| b.game_date.cmp(&a.game_date));
    games.truncate(PLAYER_WINDOW);
    games
}

/// Over/under lines for one category from the observed values.
pub fn category_lines(category: StatCategory, games: &[&PlayerGameLog]) -> Vec<ThresholdLine> {
    let values: Vec<f64> = games
        .iter()
        .map(|log| category.value(log))
        .filter(|v| v.is_finite())
        .collect();

    let Some(fit) = GaussianFit::fit(&values) else {
        return vec![ThresholdLine::unavailable()];
    };

    category
        .thresholds()
        .iter()
        .flat_map(|threshold| {
            let over = fit.prob_over(*threshold);
            [
                ThresholdLine {
                    condition: format!("Over {}", threshold),
                    prob: LineProbability::Percent(round2(over * 100.0)),
                },
                ThresholdLine {
                    condition: format!("Under {}", threshold),
                    prob: LineProbability::Percent(round2((1.0 - over) * 100.0)),
                },
            ]
        })
        .collect()
}

/// Lines for every tracked category, keyed by category label.
pub fn predict_thresholds(
    logs: &[PlayerGameLog],
    opponent: &str,
) -> (usize, BTreeMap<&'static str, Vec<ThresholdLine>>) {
    let games = recent_vs_opponent(logs, opponent);
    let features = StatCategory::TRACKED
        .iter()
        .map(|category| (category.label(), category_lines(*category, &games)))
        .collect();
    (games.len(), features)
}

#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Player threshold prediction as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerPredictionResponse {
    pub player_id: String,
    pub player_name: Option<String>,
    pub game_id: String,
    pub team: Option<String>,
    pub opponent: Option<String>,
    pub games_used: usize,
    pub features: BTreeMap<&'static str, Vec<ThresholdLine>>,
    pub reason: Option<String>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{PlayerGameLog, SeasonType};
    use chrono::NaiveDate;

    pub fn log(matchup: &str, date: NaiveDate, points: f64, threes: f64) -> PlayerGameLog {
        PlayerGameLog {
            player_id: 2544,
            player_name: "LeBron James".to_string(),
            season_id: "22024".to_string(),
            season_type: SeasonType::RegularSeason,
            game_date: date,
            matchup: matchup.to_string(),
            points,
            fg3_made: threes,
            rebounds: 8.0,
            assists: 7.0,
            steals: 1.0,
            blocks: 1.0,
            turnovers: 3.0,
            fg_pct: Some(0.5),
            fg3_pct: Some(0.35),
            ft_pct: Some(0.75),
            plus_minus: Some(4.0),
        }
    }
}
