//! MindWell Server — application entry point.

use std::process::ExitCode;

use mindwell_server::{config::ServerConfig, start_server};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "mindwell_server=info,mindwell_auth=info,mindwell_db=info,tower_http=info";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .json()
        .init();

    tracing::info!("Starting MindWell server...");

    let result = match ServerConfig::from_env() {
        Ok(config) => start_server(config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => {
            tracing::info!("MindWell server stopped.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "MindWell server failed");
            ExitCode::FAILURE
        }
    }
}
