use anyhow::Result;
use dotenv::dotenv;
use prediction_service_rust::commands::{error_body, usage};
use prediction_service_rust::{Command, PredictionService, ServiceConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Logs go to stderr; stdout carries the JSON response
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(_) => {
            eprintln!("{}", usage());
            std::process::exit(2);
        }
    };

    let config = ServiceConfig::from_env()?;
    info!("Starting prediction service: {:?}", command);

    let outcome = match PredictionService::from_config(&config) {
        Ok(service) => service.run(command).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {}", e);
            println!("{}", serde_json::to_string_pretty(&error_body(&e))?);
            std::process::exit(1);
        }
    }
}
