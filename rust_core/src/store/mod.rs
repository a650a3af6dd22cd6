//! Historical Game Store.
//!
//! Read-only team-game records, one row per team per game, with a per-team
//! index kept in date-descending order so "most recent first" never depends
//! on the order rows appear in the source file.

pub mod loader;

use crate::error::StoreError;
use crate::league_config::normalize_code;
use crate::models::{GameRecord, Location};
use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::path::Path;
use tracing::warn;

pub use loader::LoadReport;

#[derive(Debug, Clone, Default)]
pub struct HistoricalStore {
    records: Vec<GameRecord>,
    /// team abbreviation -> record indices, most recent first
    by_team: FxHashMap<String, Vec<usize>>,
    duplicates_dropped: usize,
}

impl HistoricalStore {
    /// Build a store from records. The first row seen for a (team, date)
    /// pair wins; later duplicates are dropped.
    pub fn from_records(records: Vec<GameRecord>) -> Self {
        let mut seen: FxHashSet<(String, NaiveDate)> = FxHashSet::default();
        let mut kept = Vec::with_capacity(records.len());
        let mut duplicates_dropped = 0;

        for record in records {
            if seen.insert((record.team_abbr.clone(), record.game_date)) {
                kept.push(record);
            } else {
                duplicates_dropped += 1;
            }
        }

        if duplicates_dropped > 0 {
            warn!(
                "Dropped {} duplicate (team, date) game rows",
                duplicates_dropped
            );
        }

        let mut by_team: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (idx, record) in kept.iter().enumerate() {
            by_team.entry(record.team_abbr.clone()).or_default().push(idx);
        }
        for indices in by_team.values_mut() {
            indices.sort_by(|a, b| kept[*b].game_date.cmp(&kept[*a].game_date));
        }

        Self {
            records: kept,
            by_team,
            duplicates_dropped,
        }
    }

    /// Load the collector's CSV export.
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let (records, _) = loader::load_csv_file(path)?;
        Ok(Self::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }

    pub fn has_team(&self, team_abbr: &str) -> bool {
        self.by_team.contains_key(&normalize_code(team_abbr))
    }

    /// All games for a team, most recent first.
    pub fn team_games<'a>(&'a self, team_abbr: &str) -> impl Iterator<Item = &'a GameRecord> + 'a {
        self.by_team
            .get(&normalize_code(team_abbr))
            .map(|indices| indices.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |idx| &self.records[*idx])
    }

    /// Games played strictly before `date`, most recent first.
    pub fn games_before<'a>(
        &'a self,
        team_abbr: &str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a GameRecord> + 'a {
        self.team_games(team_abbr)
            .filter(move |record| record.game_date < date)
    }

    /// Up to `limit` most recent games, optionally only those before a date.
    pub fn recent_games(
        &self,
        team_abbr: &str,
        before: Option<NaiveDate>,
        limit: usize,
    ) -> Vec<&GameRecord> {
        match before {
            Some(date) => self.games_before(team_abbr, date).take(limit).collect(),
            None => self.team_games(team_abbr).take(limit).collect(),
        }
    }

    pub fn last_game_before(&self, team_abbr: &str, date: NaiveDate) -> Option<&GameRecord> {
        self.games_before(team_abbr, date).next()
    }

    /// Games `home_abbr` played at home against `away_abbr`, most recent first.
    pub fn home_meetings<'a>(
        &'a self,
        home_abbr: &str,
        away_abbr: &str,
    ) -> impl Iterator<Item = &'a GameRecord> + 'a {
        let opponent = normalize_code(away_abbr);
        self.team_games(home_abbr).filter(move |record| {
            record.location == Location::Home && record.opp_abbr == opponent
        })
    }

    /// Dataset overview: win rates, league averages and top scoring teams.
    pub fn summary(&self, top_n: usize) -> DatasetSummary {
        let rows = self.records.len();
        let mean = |f: fn(&GameRecord) -> f64| -> Option<f64> {
            if rows == 0 {
                None
            } else {
                Some(self.records.iter().map(f).sum::<f64>() / rows as f64)
            }
        };
        let win_rate_at = |location: Location| -> Option<f64> {
            let (games, wins) = self
                .records
                .iter()
                .filter(|r| r.location == location)
                .fold((0usize, 0usize), |(g, w), r| (g + 1, w + r.win as usize));
            (games > 0).then(|| wins as f64 / games as f64)
        };

        let mut top_scoring: Vec<TeamScoring> = self
            .by_team
            .iter()
            .filter_map(|(abbr, indices)| {
                let latest = self.records.get(*indices.first()?)?;
                let games = indices.len();
                let points: f64 = indices.iter().map(|i| self.records[*i].points).sum();
                let wins = indices.iter().filter(|i| self.records[**i].win).count();
                Some(TeamScoring {
                    team_abbr: abbr.clone(),
                    team_name: latest.team_name.clone(),
                    games,
                    wins,
                    avg_points: points / games as f64,
                })
            })
            .collect();
        top_scoring.sort_by(|a, b| {
            b.avg_points
                .total_cmp(&a.avg_points)
                .then_with(|| a.team_abbr.cmp(&b.team_abbr))
        });
        top_scoring.truncate(top_n);

        DatasetSummary {
            rows,
            teams: self.by_team.len(),
            first_date: self.records.iter().map(|r| r.game_date).min(),
            last_date: self.records.iter().map(|r| r.game_date).max(),
            overall_win_rate: mean(GameRecord::win_indicator),
            home_win_rate: win_rate_at(Location::Home),
            away_win_rate: win_rate_at(Location::Away),
            avg_points: mean(|r| r.points),
            avg_rebounds: mean(|r| r.rebounds),
            avg_assists: mean(|r| r.assists),
            avg_turnovers: mean(|r| r.turnovers),
            top_scoring,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamScoring {
    pub team_abbr: String,
    pub team_name: String,
    pub games: usize,
    pub wins: usize,
    pub avg_points: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub teams: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub overall_win_rate: Option<f64>,
    pub home_win_rate: Option<f64>,
    pub away_win_rate: Option<f64>,
    pub avg_points: Option<f64>,
    pub avg_rebounds: Option<f64>,
    pub avg_assists: Option<f64>,
    pub avg_turnovers: Option<f64>,
    pub top_scoring: Vec<TeamScoring>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::SeasonType;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn record(
        team: &str,
        opp: &str,
        game_date: NaiveDate,
        location: Location,
        points: f64,
        win: bool,
    ) -> GameRecord {
        GameRecord {
            team_id: 0,
            team_name: format!("{} Team", team),
            team_abbr: team.to_string(),
            opp_abbr: opp.to_string(),
            game_date,
            location,
            points,
            rebounds: 44.0,
            assists: 25.0,
            turnovers: 13.0,
            win,
            season_type: SeasonType::RegularSeason,
        }
    }

    /// Two teams alternating games with a noisy points-driven outcome
    pub fn trainable_store(rows: usize) -> HistoricalStore {
        let records = (0..rows)
            .map(|i| {
                let team = if i % 2 == 0 { "LAL" } else { "BOS" };
                let opp = if i % 2 == 0 { "BOS" } else { "LAL" };
                let location = if i % 3 == 0 { Location::Home } else { Location::Away };
                let points = 95.0 + (i % 30) as f64;
                let noise = ((i * 37) % 23) as f64 - 11.0;
                let mut r = record(
                    team,
                    opp,
                    date(2020, 1, 1) + chrono::Duration::days(i as i64),
                    location,
                    points,
                    points + noise > 108.0,
                );
                r.turnovers = 10.0 + ((i * 7) % 9) as f64;
                r.rebounds = 40.0 + ((i * 3) % 11) as f64;
                r.assists = 22.0 + ((i * 5) % 9) as f64;
                r
            })
            .collect();
        HistoricalStore::from_records(records)
    }
}
