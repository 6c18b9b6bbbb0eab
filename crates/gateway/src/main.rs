//! `tokengate` gateway — sidecar binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (tracing, optional OTEL).
//! 3. Initialise AWS SDK clients.
//! 4. Fetch the encryption key from Secrets Manager and seed [`KeyStore`].
//! 5. List the stored token envelopes from S3 into [`EnvelopeCache`].
//! 6. Spawn background tasks: key refresh, envelope refresh.
//! 7. Build the Axum router and start the HTTP server.

mod aws;
mod config;
mod key;
mod server;
mod telemetry;
mod tokens;

use anyhow::Result;
use tracing::info;

use config::Config;
use key::KeyStore;
use server::state::AppState;
use tokens::EnvelopeCache;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        http_port = cfg.http_port,
        "tokengate gateway starting"
    );

    // -----------------------------------------------------------------------
    // 3. AWS clients
    // -----------------------------------------------------------------------
    let aws = aws::AwsClients::init().await?;

    // -----------------------------------------------------------------------
    // 4. Encryption key initialisation
    // -----------------------------------------------------------------------
    let key_store = KeyStore::new();
    key::fetch_and_store(&aws, &cfg, &key_store).await?;

    // -----------------------------------------------------------------------
    // 5. Envelope cache initialisation
    // -----------------------------------------------------------------------
    let envelope_cache = EnvelopeCache::new();
    tokens::load_all(&aws, &cfg, &envelope_cache).await?;

    // -----------------------------------------------------------------------
    // 6. Background tasks
    // -----------------------------------------------------------------------
    let _key_refresh = key::refresh_task(aws.clone(), cfg.clone(), key_store.clone());
    let _envelope_refresh = tokens::refresh_task(aws.clone(), cfg.clone(), envelope_cache.clone());

    // -----------------------------------------------------------------------
    // 7. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(key_store, envelope_cache, &cfg);
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.http_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
