use anyhow::Result;
use mesh_core::{config::Config, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let prometheus = telemetry::init(&config.telemetry)?;

    info!("Starting Mesh Core Service");
    info!("HTTP server listening on {}", config.http_addr());
    info!("Serving resources under {}", config.rest.base_path);

    server::run(config, prometheus).await
}
