//! Address check server.
//!
//! Loads municipal boundaries at startup and serves `POST /check-address`
//! and `GET /health`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use citybound::api::{create_router, AppState};
use citybound::config::Config;
use citybound::geocoding::GoogleGeocoder;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Municipal boundary address check server")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Listen port (replaces the port of the configured listen address)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Geocoding provider API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Citybound Server");
    info!("Config: {}", args.config.display());

    let config = Config::load_from_file(&args.config)?;

    let api_key = args
        .google_api_key
        .or_else(|| config.geocoding.api_key.clone())
        .filter(|k| !k.is_empty())
        .context("No geocoding API key: set GOOGLE_API_KEY or geocoding.api_key")?;

    let geocoder = GoogleGeocoder::new(
        &api_key,
        &config.geocoding.base_url,
        Duration::from_secs(config.geocoding.timeout_secs),
    )
    .context("Failed to create geocoding client")?;

    // Boundaries must all load before we accept requests
    let state = AppState::load(&config.municipalities, Arc::new(geocoder))
        .context("Failed to load municipal boundaries")?;

    let app = create_router(Arc::new(state));

    let listen = config.listen_addr(args.port);
    info!("Server listening at http://{}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
