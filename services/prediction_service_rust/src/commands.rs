//! Command parsing and dispatch

use crate::config::ServiceConfig;
use anyhow::{anyhow, Result};
use chrono::Utc;
use hoopcast_core::clients::{CsvPlayerLogs, EspnScheduleClient, ScheduleSource};
use hoopcast_core::{ClassifierService, GamePredictor, HistoricalStore, PlayerForecaster, PredictionError};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Predict { game_id: String },
    Player { player_id: String, game_id: String },
    Upcoming,
    Slate,
    Team { query: String },
    Summary,
}

impl Command {
    /// Parse `<command> [args...]` (program name already stripped).
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut iter = args.iter().map(|s| s.as_str());
        let name = iter.next().ok_or_else(|| anyhow!(usage()))?;
        let rest: Vec<&str> = iter.collect();

        match (name, rest.as_slice()) {
            ("predict", [game_id]) => Ok(Command::Predict {
                game_id: game_id.to_string(),
            }),
            ("player", [player_id, game_id]) => Ok(Command::Player {
                player_id: player_id.to_string(),
                game_id: game_id.to_string(),
            }),
            ("upcoming", []) => Ok(Command::Upcoming),
            ("slate", []) => Ok(Command::Slate),
            ("team", words) if !words.is_empty() => Ok(Command::Team {
                query: words.join(" "),
            }),
            ("summary", []) => Ok(Command::Summary),
            _ => Err(anyhow!(usage())),
        }
    }
}

pub fn usage() -> &'static str {
    "usage: prediction_service_rust <predict GAME_ID | player PLAYER_ID GAME_ID | upcoming | slate | team NAME | summary>"
}

/// Loaded data and clients shared by every command
pub struct PredictionService {
    predictor: GamePredictor,
    forecaster: Option<PlayerForecaster>,
}

impl PredictionService {
    pub fn from_config(config: &ServiceConfig) -> Result<Self, PredictionError> {
        let store = Arc::new(HistoricalStore::load_csv(&config.history_csv_path)?);
        let schedule: Arc<dyn ScheduleSource> =
            Arc::new(EspnScheduleClient::with_config(config.espn()));

        let forecaster = match CsvPlayerLogs::load(&config.player_logs_csv_path) {
            Ok(logs) => Some(PlayerForecaster::new(Arc::new(logs), schedule.clone())),
            Err(e) => {
                warn!("Player logs unavailable: {}", e);
                None
            }
        };

        info!("Historical store ready ({} rows)", store.len());
        Ok(Self::new(
            GamePredictor::new(Arc::new(ClassifierService::new(store)), schedule),
            forecaster,
        ))
    }

    pub fn new(predictor: GamePredictor, forecaster: Option<PlayerForecaster>) -> Self {
        Self {
            predictor,
            forecaster,
        }
    }

    pub async fn run(&self, command: Command) -> Result<Value, PredictionError> {
        match command {
            Command::Predict { game_id } => to_json(&self.predictor.predict(&game_id).await?),
            Command::Player { player_id, game_id } => {
                let forecaster = self.forecaster.as_ref().ok_or_else(|| {
                    PredictionError::PlayerLogsUnavailable("no player log file loaded".to_string())
                })?;
                to_json(&forecaster.predict(&player_id, &game_id).await?)
            }
            Command::Upcoming => to_json(&self.predictor.upcoming().await),
            Command::Slate => to_json(&self.predictor.predict_slate().await?),
            Command::Team { query } => {
                to_json(&self.predictor.team_report(&query, Utc::now().date_naive())?)
            }
            Command::Summary => to_json(&self.predictor.summary()),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, PredictionError> {
    Ok(serde_json::to_value(value)?)
}

/// Body printed for a failed command
pub fn error_body(err: &PredictionError) -> Value {
    json!({
        "error": err.to_string(),
        "kind": err.kind(),
    })
}
