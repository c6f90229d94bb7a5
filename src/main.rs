use anyhow::Result;
use portcullis_core::{config::Config, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let prometheus_handle = telemetry::init(&config.telemetry)?;

    info!("Starting {}", config.telemetry.service_name);
    info!(
        reverse_proxy_auth = config.auth.reverse_proxy_auth_enabled,
        auto_register = config.auth.reverse_proxy_auto_register,
        "HTTP server listening on {}",
        config.http_addr()
    );

    server::run(config, prometheus_handle).await
}
