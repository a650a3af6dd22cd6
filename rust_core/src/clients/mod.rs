//! External data sources: the live schedule feed and player game logs.
//!
//! The predictor only sees the [`ScheduleSource`] and [`PlayerLogSource`]
//! traits so the feed can be swapped for fixtures in tests.

pub mod espn;
pub mod player_logs;

use crate::models::{PlayerGameLog, ScheduledGame};
use anyhow::Result;
use async_trait::async_trait;
use rustc_hash::FxHashMap;

pub use espn::EspnScheduleClient;
pub use player_logs::CsvPlayerLogs;

/// Read-only schedule feed keyed by game identifier
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// `Ok(None)` when the feed does not know the game
    async fn game(&self, game_id: &str) -> Result<Option<ScheduledGame>>;

    /// Games that have not started yet
    async fn upcoming(&self) -> Result<Vec<ScheduledGame>>;
}

/// Per-player game logs, most recent seasons first
#[async_trait]
pub trait PlayerLogSource: Send + Sync {
    /// `Ok(None)` when the player is unknown
    async fn game_logs(&self, player_id: &str) -> Result<Option<Vec<PlayerGameLog>>>;
}

/// Fixed schedule held in memory
#[derive(Debug, Default, Clone)]
pub struct InMemorySchedule {
    games: Vec<ScheduledGame>,
}

impl InMemorySchedule {
    pub fn new(games: Vec<ScheduledGame>) -> Self {
        Self { games }
    }
}

#[async_trait]
impl ScheduleSource for InMemorySchedule {
    async fn game(&self, game_id: &str) -> Result<Option<ScheduledGame>> {
        Ok(self.games.iter().find(|g| g.game_id == game_id).cloned())
    }

    async fn upcoming(&self) -> Result<Vec<ScheduledGame>> {
        let mut games = self.games.clone();
        games.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(games)
    }
}

/// Player logs held in memory, keyed by player id
#[derive(Debug, Default, Clone)]
pub struct InMemoryPlayerLogs {
    logs: FxHashMap<String, Vec<PlayerGameLog>>,
}

impl InMemoryPlayerLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, player_id: &str, logs: Vec<PlayerGameLog>) {
        self.logs.insert(player_id.to_string(), logs);
    }
}

#[async_trait]
impl PlayerLogSource for InMemoryPlayerLogs {
    async fn game_logs(&self, player_id: &str) -> Result<Option<Vec<PlayerGameLog>>> {
        Ok(self.logs.get(player_id).cloned())
    }
}
