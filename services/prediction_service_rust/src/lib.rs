//! prediction_service_rust - command-line front end for hoopcast predictions

pub mod commands;
pub mod config;

pub use commands::{Command, PredictionService};
pub use config::ServiceConfig;
