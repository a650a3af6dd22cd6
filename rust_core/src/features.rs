//! Feature computation for classifier inputs.
//!
//! A team's form is the mean box score over its most recent completed games
//! strictly before a reference date, plus the location of the latest of them.

use crate::models::{GameRecord, Location};
use crate::store::HistoricalStore;
use chrono::NaiveDate;
use serde::Serialize;

/// Number of recent games averaged into a form snapshot
pub const FORM_WINDOW: usize = 10;

/// Number of classifier inputs
pub const FEATURE_COUNT: usize = 5;

/// Classifier input order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["points", "rebounds", "assists", "turnovers", "home_flag"];

/// Ordered classifier input: (points, rebounds, assists, turnovers, home-flag)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn from_record(record: &GameRecord) -> Self {
        Self([
            record.points,
            record.rebounds,
            record.assists,
            record.turnovers,
            record.location.home_flag(),
        ])
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Averaged recent form for one team as of a reference date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamFormSnapshot {
    pub team_abbr: String,
    pub as_of: NaiveDate,
    pub games_used: usize,
    pub avg_points: f64,
    pub avg_rebounds: f64,
    pub avg_assists: f64,
    pub avg_turnovers: f64,
    /// Location of the single most recent game
    pub last_location: Location,
}

impl TeamFormSnapshot {
    pub fn features(&self) -> FeatureVector {
        FeatureVector([
            self.avg_points,
            self.avg_rebounds,
            self.avg_assists,
            self.avg_turnovers,
            self.last_location.home_flag(),
        ])
    }
}

/// Build a team's form from up to [`FORM_WINDOW`] games before `as_of`.
///
/// Returns `None` when the team has no games before the reference date.
/// Fewer than ten games are averaged over however many exist.
pub fn build_form(
    store: &HistoricalStore,
    team_abbr: &str,
    as_of: NaiveDate,
) -> Option<TeamFormSnapshot> {
    let recent = store.recent_games(team_abbr, Some(as_of), FORM_WINDOW);
    let latest = recent.first()?;
    let n = recent.len() as f64;

    let avg = |stat: fn(&GameRecord) -> f64| recent.iter().map(|r| stat(r)).sum::<f64>() / n;

    Some(TeamFormSnapshot {
        team_abbr: latest.team_abbr.clone(),
        as_of,
        games_used: recent.len(),
        avg_points: avg(|r| r.points),
        avg_rebounds: avg(|r| r.rebounds),
        avg_assists: avg(|r| r.assists),
        avg_turnovers: avg(|r| r.turnovers),
        last_location: latest.location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{date, record};

    fn team_with_points(points: &[f64]) -> HistoricalStore {
        // points[0] is the most recent game; stored oldest-first to exercise the index
        let records = points
            .iter()
            .enumerate()
            .rev()
            .map(|(i, p)| {
                let location = if i == 0 { Location::Away } else { Location::Home };
                record("LAL", "BOS", date(2024, 3, 20) - chrono::Duration::days(i as i64 + 1), location, *p, true)
            })
            .collect();
        HistoricalStore::from_records(records)
    }

    #[test]
    fn test_averages_exactly_ten_most_recent() {
        let points = [
            100.0, 110.0, 90.0, 105.0, 95.0, 120.0, 80.0, 100.0, 115.0, 85.0, // last 10
            200.0, 300.0, // older, must be ignored
        ];
        let store = team_with_points(&points);
        let form = build_form(&store, "LAL", date(2024, 3, 20)).unwrap();

        let expected: f64 = points[..10].iter().sum::<f64>() / 10.0;
        assert_eq!(form.games_used, 10);
        assert!((form.avg_points - expected).abs() < 1e-12);
        assert_eq!(form.last_location, Location::Away);
        assert_eq!(form.features().values()[4], 0.0);
    }

    #[test]
    fn test_short_history_not_padded() {
        let store = team_with_points(&[100.0, 110.0, 120.0]);
        let form = build_form(&store, "LAL", date(2024, 3, 20)).unwrap();
        assert_eq!(form.games_used, 3);
        assert!((form.avg_points - 110.0).abs() < 1e-12);
        assert_eq!(form.avg_rebounds, 44.0);
    }

    #[test]
    fn test_reference_date_excludes_same_day_and_later() {
        let store = team_with_points(&[100.0, 110.0, 120.0]);
        // Only the game on 03-17 is strictly before 03-18
        let form = build_form(&store, "LAL", date(2024, 3, 18)).unwrap();
        assert_eq!(form.games_used, 1);
        assert_eq!(form.avg_points, 120.0);
    }

    #[test]
    fn test_no_history_returns_none() {
        let store = team_with_points(&[100.0]);
        assert!(build_form(&store, "BOS", date(2024, 3, 20)).is_none());
        assert!(build_form(&store, "LAL", date(2020, 1, 1)).is_none());
    }

    #[test]
    fn test_feature_vector_order() {
        let r = record("LAL", "BOS", date(2024, 1, 1), Location::Home, 101.0, true);
        let fv = FeatureVector::from_record(&r);
        assert_eq!(fv.values(), &[101.0, 44.0, 25.0, 13.0, 1.0]);
        assert!(fv.is_finite());
    }
}
