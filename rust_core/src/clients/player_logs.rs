//! Player game logs exported from the stats provider as CSV.
//!
//! Expected columns (stats-API names): `PLAYER_ID, PLAYER_NAME, SEASON_ID,
//! SEASON_TYPE, GAME_DATE, MATCHUP, PTS, FG3M, REB, AST, STL, BLK, TOV,
//! FG_PCT, FG3_PCT, FT_PCT, PLUS_MINUS`. `SEASON_TYPE` and `PLAYER_NAME`
//! may be missing; the season type then comes from the `SEASON_ID` prefix.

use super::PlayerLogSource;
use crate::error::StoreError;
use crate::models::{PlayerGameLog, SeasonType};
use crate::store::loader::parse_date;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct RawLogRow {
    #[serde(rename = "PLAYER_ID", alias = "Player_ID", default)]
    player_id: Option<String>,
    #[serde(rename = "PLAYER_NAME", default)]
    player_name: Option<String>,
    #[serde(rename = "SEASON_ID", default)]
    season_id: Option<String>,
    #[serde(rename = "SEASON_TYPE", default)]
    season_type: Option<String>,
    #[serde(rename = "GAME_DATE", default)]
    game_date: Option<String>,
    #[serde(rename = "MATCHUP", default)]
    matchup: Option<String>,
    #[serde(rename = "PTS", default, deserialize_with = "csv::invalid_option")]
    pts: Option<f64>,
    #[serde(rename = "FG3M", default, deserialize_with = "csv::invalid_option")]
    fg3m: Option<f64>,
    #[serde(rename = "REB", default, deserialize_with = "csv::invalid_option")]
    reb: Option<f64>,
    #[serde(rename = "AST", default, deserialize_with = "csv::invalid_option")]
    ast: Option<f64>,
    #[serde(rename = "STL", default, deserialize_with = "csv::invalid_option")]
    stl: Option<f64>,
    #[serde(rename = "BLK", default, deserialize_with = "csv::invalid_option")]
    blk: Option<f64>,
    #[serde(rename = "TOV", default, deserialize_with = "csv::invalid_option")]
    tov: Option<f64>,
    #[serde(rename = "FG_PCT", default, deserialize_with = "csv::invalid_option")]
    fg_pct: Option<f64>,
    #[serde(rename = "FG3_PCT", default, deserialize_with = "csv::invalid_option")]
    fg3_pct: Option<f64>,
    #[serde(rename = "FT_PCT", default, deserialize_with = "csv::invalid_option")]
    ft_pct: Option<f64>,
    #[serde(rename = "PLUS_MINUS", default, deserialize_with = "csv::invalid_option")]
    plus_minus: Option<f64>,
}

/// All logs from one export, indexed by player id, most recent first
#[derive(Debug, Default, Clone)]
pub struct CsvPlayerLogs {
    by_player: FxHashMap<String, Vec<PlayerGameLog>>,
}

impl CsvPlayerLogs {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|source| StoreError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;
        let logs = Self::from_reader(file)?;
        info!(
            "Loaded game logs for {} players from {}",
            logs.player_count(),
            path_ref.display()
        );
        Ok(logs)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StoreError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut by_player: FxHashMap<String, Vec<PlayerGameLog>> = FxHashMap::default();
        for (line, row) in csv_reader.deserialize::<RawLogRow>().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    debug!("Skipping malformed player log row {}: {}", line + 2, e);
                    continue;
                }
            };
            match parse_log(row) {
                Some(log) => by_player
                    .entry(log.player_id.to_string())
                    .or_default()
                    .push(log),
                None => debug!("Skipping incomplete player log row {}", line + 2),
            }
        }
        for logs in by_player.values_mut() {
            logs.sort_by(|a, b| b.game_date.cmp(&a.game_date));
        }
        Ok(Self { by_player })
    }

    pub fn player_count(&self) -> usize {
        self.by_player.len()
    }
}

#[async_trait]
impl PlayerLogSource for CsvPlayerLogs {
    async fn game_logs(&self, player_id: &str) -> Result<Option<Vec<PlayerGameLog>>> {
        Ok(self.by_player.get(player_id.trim()).cloned())
    }
}

fn parse_log(row: RawLogRow) -> Option<PlayerGameLog> {
    let player_id = row.player_id?.trim().parse::<u64>().ok()?;
    let season_id = row.season_id.unwrap_or_default();
    let season_type = row
        .season_type
        .as_deref()
        .and_then(SeasonType::parse)
        .or_else(|| season_type_from_id(&season_id))?;

    Some(PlayerGameLog {
        player_id,
        player_name: row.player_name.unwrap_or_default(),
        season_id,
        season_type,
        game_date: parse_log_date(row.game_date.as_deref()?)?,
        matchup: row.matchup.filter(|m| !m.is_empty())?,
        points: row.pts?,
        fg3_made: row.fg3m?,
        rebounds: row.reb?,
        assists: row.ast?,
        steals: row.stl.unwrap_or(0.0),
        blocks: row.blk.unwrap_or(0.0),
        turnovers: row.tov?,
        fg_pct: row.fg_pct,
        fg3_pct: row.fg3_pct,
        ft_pct: row.ft_pct,
        plus_minus: row.plus_minus,
    })
}

/// Season ids are prefixed 2 for regular season and 4 for playoffs (`22024`, `42024`)
fn season_type_from_id(season_id: &str) -> Option<SeasonType> {
    match season_id.chars().next()? {
        '2' => Some(SeasonType::RegularSeason),
        '4' => Some(SeasonType::Playoffs),
        _ => None,
    }
}

/// `2024-04-14` or the stats API's `APR 14, 2024`
fn parse_log_date(raw: &str) -> Option<NaiveDate> {
    parse_date(raw).or_else(|| {
        let mut normalized = raw.trim().to_ascii_lowercase();
        if let Some(first) = normalized.get_mut(..1) {
            first.make_ascii_uppercase();
        }
        NaiveDate::parse_from_str(&normalized, "%b %d, %Y").ok()
    })
}
