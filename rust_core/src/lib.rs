//! Hoopcast Core - pregame NBA win probabilities and player threshold lines.
//!
//! This crate provides:
//! - A historical team-game store loaded from the collector's CSV export
//! - Recent-form features and a logistic-regression win classifier
//! - Head-to-head, home-court and rest-day signals
//! - A fixed-weight blender producing a normalized win-probability pair
//! - Gaussian over/under lines for player stat thresholds
//! - The live schedule feed client guarded by a circuit breaker

pub mod circuit_breaker;
pub mod classifier;
pub mod clients;
pub mod error;
pub mod features;
pub mod league_config;
pub mod models;
pub mod player;
pub mod predictor;
pub mod signals;
pub mod store;
pub mod win_prob;

pub use classifier::{ClassifierService, TrainedModel};
pub use error::{ClassifierUnavailable, ErrorKind, PredictionError, StoreError};
pub use models::{GameRecord, Location, PlayerGameLog, ScheduledGame, SeasonType};
pub use predictor::{GamePredictor, PlayerForecaster, TeamReport};
pub use store::HistoricalStore;
pub use win_prob::{PredictionResponse, Probabilities};
