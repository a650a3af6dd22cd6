//! ESPN NBA schedule feed.
//!
//! `summary?event=<id>` resolves a single game, `scoreboard` lists the day's
//! slate. Every request is bounded by the configured timeout and goes through
//! a [`FeedBreaker`] so a dead feed fails fast.

use super::ScheduleSource;
use crate::circuit_breaker::{BreakerConfig, BreakerState, FeedBreaker};
use crate::league_config::normalize_code;
use crate::models::ScheduledGame;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://site.api.espn.com/apis/site/v2/sports/basketball/nba";

#[derive(Debug, Clone)]
pub struct EspnConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub breaker: BreakerConfig,
}

impl Default for EspnConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(6),
            breaker: BreakerConfig::default(),
        }
    }
}

#[derive(Clone)]
pub struct EspnScheduleClient {
    client: Client,
    base_url: String,
    breaker: Arc<FeedBreaker>,
}

impl std::fmt::Debug for EspnScheduleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EspnScheduleClient")
            .field("base_url", &self.base_url)
            .field("breaker_state", &self.breaker.state())
            .finish()
    }
}

impl EspnScheduleClient {
    pub fn new() -> Self {
        Self::with_config(EspnConfig::default())
    }

    pub fn with_config(config: EspnConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            breaker: Arc::new(FeedBreaker::new("espn", config.breaker)),
        }
    }

    /// Feed is reachable as far as the breaker knows
    pub fn is_available(&self) -> bool {
        self.breaker.is_available()
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    pub fn reset_breaker(&self) {
        self.breaker.reset();
    }

    /// GET `{base}/{path}` with `query`. Only transport failures, timeouts,
    /// 5xx and undecodable bodies are errors; the breaker counts those.
    async fn fetch_json(&self, path: &str, query: &[(&str, &str)]) -> Result<FeedReply> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        let resp = self.client.get(&url).query(query).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
            return Ok(FeedReply::Missing);
        }
        if status.is_server_error() {
            return Err(anyhow!("ESPN returned {} for {}", status, url));
        }
        if !status.is_success() {
            return Ok(FeedReply::Rejected(status));
        }
        Ok(FeedReply::Body(resp.json().await?))
    }

    /// Fetch through the breaker; a rejected request fails without tripping it.
    async fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<Option<Value>> {
        match self.breaker.call(self.fetch_json(path, query)).await? {
            FeedReply::Body(body) => Ok(Some(body)),
            FeedReply::Missing => Ok(None),
            FeedReply::Rejected(status) => Err(anyhow!("ESPN rejected {} with {}", path, status)),
        }
    }
}

/// A feed response that reached us
enum FeedReply {
    Body(Value),
    /// 400 or 404: no such event
    Missing,
    /// Other 4xx
    Rejected(StatusCode),
}

impl Default for EspnScheduleClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleSource for EspnScheduleClient {
    async fn game(&self, game_id: &str) -> Result<Option<ScheduledGame>> {
        let body = self
            .fetch("summary", &[("event", game_id)])
            .await
            .map_err(|e| {
                warn!("Schedule lookup for game {} failed: {}", game_id, e);
                e
            })?;
        Ok(body.and_then(|data| parse_summary(&data, game_id)))
    }

    async fn upcoming(&self) -> Result<Vec<ScheduledGame>> {
        let body = self.fetch("scoreboard", &[]).await?;
        Ok(body.map(|data| parse_scoreboard(&data)).unwrap_or_default())
    }
}

/// Build a game from a `summary` payload. `None` when the header or either
/// side is missing.
pub fn parse_summary(data: &Value, game_id: &str) -> Option<ScheduledGame> {
    let header = data.get("header")?;
    let competition = &header["competitions"][0];
    let id = header["id"].as_str().unwrap_or(game_id);
    let venue = data["gameInfo"]["venue"]["fullName"]
        .as_str()
        .map(str::to_string);
    build_game(id, competition, None, &header["season"], venue)
}

/// Not-yet-started games from a `scoreboard` payload.
pub fn parse_scoreboard(data: &Value) -> Vec<ScheduledGame> {
    let Some(events) = data["events"].as_array() else {
        return Vec::new();
    };
    events
        .iter()
        .filter(|event| event["status"]["type"]["state"].as_str() == Some("pre"))
        .filter_map(|event| {
            let id = event["id"].as_str()?;
            let competition = &event["competitions"][0];
            let venue = competition["venue"]["fullName"].as_str().map(str::to_string);
            build_game(id, competition, event["date"].as_str(), &event["season"], venue)
        })
        .collect()
}

fn build_game(
    id: &str,
    competition: &Value,
    fallback_date: Option<&str>,
    season: &Value,
    venue: Option<String>,
) -> Option<ScheduledGame> {
    let mut home = None;
    let mut away = None;
    for comp in competition["competitors"].as_array()? {
        let team = &comp["team"];
        let side = (
            normalize_code(team["abbreviation"].as_str().unwrap_or_default()),
            team["displayName"].as_str().unwrap_or_default().to_string(),
        );
        match comp["homeAway"].as_str() {
            Some("home") => home = Some(side),
            Some("away") => away = Some(side),
            _ => {}
        }
    }
    let (home_abbr, home_name) = home?;
    let (away_abbr, away_name) = away?;
    let start_time = competition["date"]
        .as_str()
        .or(fallback_date)
        .and_then(parse_feed_time)?;

    Some(ScheduledGame {
        game_id: id.to_string(),
        home_abbr,
        away_abbr,
        home_name,
        away_name,
        start_time,
        venue,
        label: season_label(season["type"].as_u64()).to_string(),
    })
}

fn season_label(season_type: Option<u64>) -> &'static str {
    match season_type {
        Some(1) => "Preseason",
        Some(3) => "Playoffs",
        Some(5) => "Play-In",
        _ => "Regular Season",
    }
}

/// Feed timestamps come as `2025-01-10T00:30Z` or full RFC 3339.
pub fn parse_feed_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|naive| naive.and_utc())
}
