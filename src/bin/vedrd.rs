//! vedrd — Vedrfolnir daemon.
//!
//! Serves the [`WeatherGateway`](vedrfolnir::WeatherGateway) over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tower::limit::GlobalConcurrencyLimitLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vedrfolnir::server::config::{Config, Secrets};
use vedrfolnir::{Vedrfolnir, VedrfolnirError, WeatherGateway};

/// Vedrfolnir daemon — caching weather gateway service.
#[derive(Parser)]
#[command(name = "vedrd")]
#[command(version = vedrfolnir::PKG_VERSION)]
#[command(about = "Vedrfolnir weather gateway daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Override the bind address from the config file.
    #[arg(short, long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;

    let gateway = Arc::new(build_gateway(&config, &secrets)?);

    // Parse address
    let addr: SocketAddr = args
        .address
        .unwrap_or_else(|| config.server.address.clone())
        .parse()
        .map_err(|e| VedrfolnirError::Configuration(format!("Invalid address: {e}")))?;

    let app = vedrfolnir::server::router(gateway).layer(GlobalConcurrencyLimitLayer::new(
        config.server.limits.max_concurrent_requests,
    ));

    info!(version = vedrfolnir::PKG_VERSION, %addr, "vedrd starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("vedrd stopped");
    Ok(())
}

/// Build a [`WeatherGateway`] from configuration.
fn build_gateway(config: &Config, secrets: &Secrets) -> Result<WeatherGateway, VedrfolnirError> {
    let api_key = secrets.api_key().ok_or_else(|| {
        VedrfolnirError::Configuration(
            "no API key found; add it to secrets.toml or set OPENWEATHERMAP_API_KEY".to_string(),
        )
    })?;

    let mut builder = Vedrfolnir::builder()
        .api_key(api_key)
        .cache_ttl(Duration::from_secs(config.cache.ttl_minutes * 60))
        .sweep_interval(Duration::from_secs(config.cache.sweep_interval_minutes * 60));

    if let Some(ref url) = config.upstream.base_url {
        builder = builder.base_url(url);
    }

    builder.build()
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("shutdown signal received");
}
