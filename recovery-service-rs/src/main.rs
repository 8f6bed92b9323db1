// recovery-service-rs/src/main.rs
// Disruption recovery HTTP API
// Port 8000 by default (RECOVERY_SERVICE_PORT / API_PORT)

use anyhow::Context;
use config_rs::Settings;
use recovery_service::{create_router, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config_rs::load_dotenv();

    let settings = Settings::from_env();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log_level.as_str()),
    )
    .init();
    routes::mark_started();

    log::info!(
        "Starting recovery service ({} environment, {} strategy)",
        settings.environment,
        settings.strategy
    );

    let state = AppState::from_settings(&settings).context("failed to initialise providers")?;
    let app = create_router(state);

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    log::info!("Recovery service listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    log::info!("Recovery service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}
