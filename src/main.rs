use anyhow::{Context, Result};
use household_power_predictor::{api, config::Config, state::AppState, telemetry};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing(telemetry::SERVER_FILTER);

    let cfg = Config::load()?;

    let addr = cfg.server.socket_addr()?;

    // Models must be ready before the listener binds
    let app_state = AppState::load(cfg.clone()).context("model unavailable")?;

    let app = api::router(app_state);

    if cfg.server.host == "0.0.0.0" {
        warn!(
            "Server binding to 0.0.0.0 - service will be accessible from network! \
            Bind to 127.0.0.1 unless behind a firewall/reverse proxy."
        );
    }

    info!(%addr, "starting household power predictor");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
