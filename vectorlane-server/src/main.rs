use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vectorlane_server::{app, Service, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vectorlane_server=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let service = Arc::new(Service::new(config.task_duration));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, task_duration = ?config.task_duration, "listening");
    axum::serve(listener, app(service)).await?;
    Ok(())
}
