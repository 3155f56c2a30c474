//! Homeguard - a deterministic threat classifier for home security sensors.
//!
//! # API Endpoints
//!
//! - `POST /assess` - Classify a security event
//! - `POST /assess/motion` - Quick motion check
//! - `POST /assess/face` - Quick face-detection check
//! - `GET /health` - Health check

use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use homeguard::ThreatClassifier;
use homeguard::api::{AppState, router};
use homeguard::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("homeguard=info".parse()?))
        .init();

    let config = Config::from_env()?;
    let addr = config.socket_addr();

    info!(
        %addr,
        utc_offset = %config.utc_offset,
        "Starting Homeguard server"
    );

    let classifier = ThreatClassifier::new();
    info!(rules = classifier.rules().len(), "Rule table loaded");

    let state = AppState::new(classifier, config.utc_offset);
    let app = router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Homeguard is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
