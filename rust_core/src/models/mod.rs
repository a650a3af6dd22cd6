// Shared models for Hoopcast services
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Historical Game Records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Home,
    Away,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Home => "Home",
            Location::Away => "Away",
        }
    }

    /// Classifier encoding: 1 for home, 0 for away
    pub fn home_flag(&self) -> f64 {
        match self {
            Location::Home => 1.0,
            Location::Away => 0.0,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home" | "h" => Some(Location::Home),
            "away" | "a" => Some(Location::Away),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeasonType {
    #[serde(rename = "Regular Season")]
    RegularSeason,
    #[serde(rename = "Playoffs")]
    Playoffs,
}

impl SeasonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonType::RegularSeason => "Regular Season",
            SeasonType::Playoffs => "Playoffs",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "regular season" | "regular" => Some(SeasonType::RegularSeason),
            "playoffs" | "playoff" | "postseason" => Some(SeasonType::Playoffs),
            _ => None,
        }
    }
}

/// One team's box score for one game. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub team_id: u64,
    pub team_name: String,
    pub team_abbr: String,
    pub opp_abbr: String,
    pub game_date: NaiveDate,
    pub location: Location,
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub turnovers: f64,
    pub win: bool,
    pub season_type: SeasonType,
}

impl GameRecord {
    pub fn win_indicator(&self) -> f64 {
        if self.win {
            1.0
        } else {
            0.0
        }
    }
}

// ============================================================================
// Live Schedule
// ============================================================================

/// Offset used to turn a feed timestamp into the local game day.
/// NBA tip-offs are scheduled on US Eastern time; day granularity tolerates DST.
const SCHEDULE_DAY_OFFSET_SECS: i32 = 5 * 3600;

/// A scheduled game as reported by the live feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledGame {
    pub game_id: String,
    pub home_abbr: String,
    pub away_abbr: String,
    pub home_name: String,
    pub away_name: String,
    pub start_time: DateTime<Utc>,
    pub venue: Option<String>,
    /// "Regular Season", "Playoffs", "Play-In", ...
    pub label: String,
}

impl ScheduledGame {
    /// Calendar date the game is played on, used as the reference date for
    /// form, rest and head-to-head lookups.
    pub fn reference_date(&self) -> NaiveDate {
        match FixedOffset::west_opt(SCHEDULE_DAY_OFFSET_SECS) {
            Some(offset) => self.start_time.with_timezone(&offset).date_naive(),
            None => self.start_time.date_naive(),
        }
    }
}

// ============================================================================
// Player Game Logs
// ============================================================================

/// Per-game player stat line from the external log provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameLog {
    pub player_id: u64,
    pub player_name: String,
    pub season_id: String,
    pub season_type: SeasonType,
    pub game_date: NaiveDate,
    /// "LAL vs. BOS" (home) or "LAL @ BOS" (away)
    pub matchup: String,
    pub points: f64,
    pub fg3_made: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub turnovers: f64,
    pub fg_pct: Option<f64>,
    pub fg3_pct: Option<f64>,
    pub ft_pct: Option<f64>,
    pub plus_minus: Option<f64>,
}
