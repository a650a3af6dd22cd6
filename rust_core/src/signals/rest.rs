//! Rest-day differential.
//!
//! Each side's rest is the number of full days between its most recent game
//! strictly before the reference date and the reference date itself (0 when
//! the team has no prior game). The differential (home − away) is clamped to
//! ±[`REST_CLAMP_DAYS`] and scaled by [`REST_BUMP_PER_DAY`].

use crate::store::HistoricalStore;
use chrono::NaiveDate;
use serde::Serialize;

pub const REST_CLAMP_DAYS: i64 = 3;
pub const REST_BUMP_PER_DAY: f64 = 0.02;

/// Full days since the team's last game before `as_of`; 0 if none on record.
pub fn rest_days(store: &HistoricalStore, team_abbr: &str, as_of: NaiveDate) -> i64 {
    store
        .last_game_before(team_abbr, as_of)
        .map(|last| (as_of - last.game_date).num_days())
        .unwrap_or(0)
}

/// Signed bump in [-0.06, +0.06] favoring the more rested side (positive = home).
pub fn rest_bump(rest_diff: i64) -> f64 {
    rest_diff.clamp(-REST_CLAMP_DAYS, REST_CLAMP_DAYS) as f64 * REST_BUMP_PER_DAY
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RestAdjustment {
    pub home_days: i64,
    pub away_days: i64,
    /// home_days − away_days, unclamped
    pub diff: i64,
    pub bump: f64,
}

impl RestAdjustment {
    pub fn from_days(home_days: i64, away_days: i64) -> Self {
        let diff = home_days - away_days;
        Self {
            home_days,
            away_days,
            diff,
            bump: rest_bump(diff),
        }
    }

    pub fn compute(
        store: &HistoricalStore,
        home_abbr: &str,
        away_abbr: &str,
        as_of: NaiveDate,
    ) -> Self {
        Self::from_days(
            rest_days(store, home_abbr, as_of),
            rest_days(store, away_abbr, as_of),
        )
    }

    /// Rest signal for one side, expressed as 0.5 ± bump
    pub fn signal(&self, for_home: bool) -> f64 {
        if for_home {
            0.5 + self.bump
        } else {
            0.5 - self.bump
        }
    }
}
