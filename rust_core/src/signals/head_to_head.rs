//! Head-to-head win rate.
//!
//! Only games the home side played *at home* against this opponent count.
//! Meetings where the home side was on the road are left out.

use crate::store::HistoricalStore;
use serde::Serialize;

/// Most recent meetings considered
pub const H2H_WINDOW: usize = 6;

/// Rate used when the teams have no qualifying meetings
pub const NEUTRAL_RATE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadToHead {
    pub home_rate: f64,
    /// Always `1 - home_rate`
    pub away_rate: f64,
    pub meetings: usize,
}

impl HeadToHead {
    pub fn neutral() -> Self {
        Self::from_home_rate(NEUTRAL_RATE, 0)
    }

    fn from_home_rate(home_rate: f64, meetings: usize) -> Self {
        Self {
            home_rate,
            away_rate: 1.0 - home_rate,
            meetings,
        }
    }
}

/// Mean win indicator over the last [`H2H_WINDOW`] home meetings.
pub fn head_to_head(store: &HistoricalStore, home_abbr: &str, away_abbr: &str) -> HeadToHead {
    let (meetings, wins) = store
        .home_meetings(home_abbr, away_abbr)
        .take(H2H_WINDOW)
        .fold((0usize, 0.0), |(n, w), record| (n + 1, w + record.win_indicator()));

    if meetings == 0 {
        return HeadToHead::neutral();
    }
    HeadToHead::from_home_rate(wins / meetings as f64, meetings)
}
