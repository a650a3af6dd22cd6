//! Error taxonomy for prediction requests.

use serde::Serialize;
use thiserror::Error;

/// Caller-facing classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InsufficientData,
    UpstreamUnavailable,
    Internal,
}

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("game not found: {0}")]
    GameNotFound(String),

    #[error("team not found: {0}")]
    TeamNotFound(String),

    #[error("player not found: {0}")]
    PlayerNotFound(String),

    #[error("player {player_id} plays for {team}, which is not in game {game_id}")]
    PlayerNotInGame {
        player_id: String,
        team: String,
        game_id: String,
    },

    #[error("schedule feed unavailable: {0}")]
    ScheduleUnavailable(String),

    #[error("player log source unavailable: {0}")]
    PlayerLogsUnavailable(String),

    #[error("historical store error: {0}")]
    Store(#[from] StoreError),

    #[error("prediction worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PredictionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictionError::GameNotFound(_)
            | PredictionError::TeamNotFound(_)
            | PredictionError::PlayerNotFound(_)
            | PredictionError::PlayerNotInGame { .. } => ErrorKind::NotFound,
            PredictionError::ScheduleUnavailable(_) | PredictionError::PlayerLogsUnavailable(_) => {
                ErrorKind::UpstreamUnavailable
            }
            PredictionError::Store(_) | PredictionError::Join(_) | PredictionError::Encode(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Upstream failures on schedule-dependent calls are answered like a missing game.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound | ErrorKind::UpstreamUnavailable
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
}

/// Why the classifier cannot be used for a request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierUnavailable {
    #[error("not enough training data")]
    InsufficientData { usable_rows: usize, required: usize },

    #[error("model failed to converge after {iterations} iterations")]
    DidNotConverge { iterations: usize },

    #[error("model training hit a singular hessian")]
    SingularHessian,
}

impl ClassifierUnavailable {
    /// Machine-readable reason carried in degraded responses
    pub fn reason(&self) -> String {
        self.to_string()
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifierUnavailable::InsufficientData { .. } => ErrorKind::InsufficientData,
            _ => ErrorKind::Internal,
        }
    }
}
