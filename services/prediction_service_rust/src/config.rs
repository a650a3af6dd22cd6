//! Configuration for prediction_service_rust

use anyhow::{anyhow, Result};
use hoopcast_core::circuit_breaker::BreakerConfig;
use hoopcast_core::clients::espn::{EspnConfig, DEFAULT_BASE_URL};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    // Data files
    pub history_csv_path: String,
    pub player_logs_csv_path: String,

    // Schedule feed
    pub espn_base_url: String,
    pub schedule_timeout_secs: u64,
    pub espn_cb_failure_threshold: u32,
    pub espn_cb_recovery_timeout_secs: u64,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let schedule_timeout_secs = parse_u64("SCHEDULE_TIMEOUT_SECS", 6)?;
        let espn_cb_failure_threshold = parse_u32("ESPN_CB_FAILURE_THRESHOLD", 5)?;

        if schedule_timeout_secs == 0 {
            return Err(anyhow!("SCHEDULE_TIMEOUT_SECS must be > 0"));
        }
        if espn_cb_failure_threshold == 0 {
            return Err(anyhow!("ESPN_CB_FAILURE_THRESHOLD must be > 0"));
        }

        Ok(Self {
            history_csv_path: env::var("HISTORY_CSV_PATH")
                .unwrap_or_else(|_| "nba_games_2020_to_2025.csv".to_string()),
            player_logs_csv_path: env::var("PLAYER_LOGS_CSV_PATH")
                .unwrap_or_else(|_| "player_game_logs.csv".to_string()),
            espn_base_url: env::var("ESPN_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            schedule_timeout_secs,
            espn_cb_failure_threshold,
            espn_cb_recovery_timeout_secs: parse_u64("ESPN_CB_RECOVERY_TIMEOUT_SECS", 30)?,
        })
    }

    pub fn espn(&self) -> EspnConfig {
        EspnConfig {
            base_url: self.espn_base_url.clone(),
            timeout: Duration::from_secs(self.schedule_timeout_secs),
            breaker: BreakerConfig {
                failure_threshold: self.espn_cb_failure_threshold,
                recovery_timeout: Duration::from_secs(self.espn_cb_recovery_timeout_secs),
                ..BreakerConfig::default()
            },
        }
    }
}

/// Parse environment variable as u32 with default fallback
fn parse_u32(var_name: &str, default: u32) -> Result<u32> {
    match env::var(var_name) {
        Ok(val) => val.parse().map_err(|_| anyhow!("{} must be a valid u32", var_name)),
        Err(_) => Ok(default),
    }
}

/// Parse environment variable as u64 with default fallback
fn parse_u64(var_name: &str, default: u64) -> Result<u64> {
    match env::var(var_name) {
        Ok(val) => val.parse().map_err(|_| anyhow!("{} must be a valid u64", var_name)),
        Err(_) => Ok(default),
    }
}
