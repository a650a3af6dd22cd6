//! CSV loader for the collector's team-game export.
//!
//! Column names are the collector's exactly:
//! `TEAM ID, TEAM NAME, TEAM ABBR, OPP ABBR, GAME DATE, HOME/AWAY,
//!  POINTS, REBOUNDS, ASSISTS, TURNOVERS, WIN, SEASON TYPE`

use crate::error::StoreError;
use crate::league_config::normalize_code;
use crate::models::{GameRecord, Location, SeasonType};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Raw row as written by the collector. Every field is optional so a single
/// blank cell costs one row, not the whole file.
#[derive(Debug, Deserialize)]
struct RawGameRow {
    #[serde(rename = "TEAM ID", default)]
    team_id: Option<String>,
    #[serde(rename = "TEAM NAME", default)]
    team_name: Option<String>,
    #[serde(rename = "TEAM ABBR", default)]
    team_abbr: Option<String>,
    #[serde(rename = "OPP ABBR", default)]
    opp_abbr: Option<String>,
    #[serde(rename = "GAME DATE", default)]
    game_date: Option<String>,
    #[serde(rename = "HOME/AWAY", default)]
    home_away: Option<String>,
    #[serde(rename = "POINTS", default)]
    points: Option<String>,
    #[serde(rename = "REBOUNDS", default)]
    rebounds: Option<String>,
    #[serde(rename = "ASSISTS", default)]
    assists: Option<String>,
    #[serde(rename = "TURNOVERS", default)]
    turnovers: Option<String>,
    #[serde(rename = "WIN", default)]
    win: Option<String>,
    #[serde(rename = "SEASON TYPE", default)]
    season_type: Option<String>,
}

/// Counts from a single load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
}

/// Load records from a CSV file on disk.
pub fn load_csv_file<P: AsRef<Path>>(path: P) -> Result<(Vec<GameRecord>, LoadReport), StoreError> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref).map_err(|source| StoreError::Io {
        path: path_ref.display().to_string(),
        source,
    })?;
    let (records, report) = load_from_reader(file)?;
    info!(
        "Loaded {} game records from {} ({} rows skipped)",
        records.len(),
        path_ref.display(),
        report.rows_skipped
    );
    Ok((records, report))
}

/// Load records from any reader producing the collector's CSV.
pub fn load_from_reader<R: Read>(reader: R) -> Result<(Vec<GameRecord>, LoadReport), StoreError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for (line, row) in csv_reader.deserialize::<RawGameRow>().enumerate() {
        report.rows_read += 1;
        let row = match row {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                report.rows_skipped += 1;
                warn!("Skipping malformed game row {}: {}", line + 2, e);
                continue;
            }
        };
        match parse_row(row) {
            Some(record) => records.push(record),
            None => {
                report.rows_skipped += 1;
                debug!("Skipping incomplete game row {}", line + 2);
            }
        }
    }

    Ok((records, report))
}

fn parse_row(row: RawGameRow) -> Option<GameRecord> {
    let team_abbr = non_empty(row.team_abbr)?;
    let opp_abbr = non_empty(row.opp_abbr)?;
    let game_date = parse_date(&non_empty(row.game_date)?)?;
    let location = Location::parse(&non_empty(row.home_away)?)?;
    let win = parse_win(&non_empty(row.win)?)?;

    let season_type = match non_empty(row.season_type) {
        Some(raw) => SeasonType::parse(&raw)?,
        None => SeasonType::RegularSeason,
    };

    Some(GameRecord {
        team_id: non_empty(row.team_id)
            .and_then(|v| parse_number(&v))
            .map(|v| v as u64)
            .unwrap_or(0),
        team_name: non_empty(row.team_name).unwrap_or_else(|| team_abbr.clone()),
        team_abbr: normalize_code(&team_abbr),
        opp_abbr: normalize_code(&opp_abbr),
        game_date,
        location,
        points: parse_stat(row.points)?,
        rebounds: parse_stat(row.rebounds)?,
        assists: parse_stat(row.assists)?,
        turnovers: parse_stat(row.turnovers)?,
        win,
        season_type,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Box-score stats must be present, finite and non-negative
fn parse_stat(raw: Option<String>) -> Option<f64> {
    non_empty(raw)
        .and_then(|v| parse_number(&v))
        .filter(|v| *v >= 0.0)
}

/// Accepts `YYYY-MM-DD` with an optional time suffix (`2024-01-15 00:00:00`, `2024-01-15T00:00:00`)
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_win(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "w" | "true" => Some(true),
        "0" | "0.0" | "l" | "false" => Some(false),
        _ => None,
    }
}
