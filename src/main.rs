use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use taxflow::config::AppConfig;
use taxflow::handlers;
use taxflow::services::notify::LogNotifier;
use taxflow::services::roster;
use taxflow::state::AppState;
use taxflow::store::Stores;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let stores = Stores::new();
    let pros = roster::load_roster(config.roster_path.as_deref())?;
    roster::seed_roster(&stores, pros);

    let state = Arc::new(AppState {
        stores,
        config: config.clone(),
        notifier: Box::new(LogNotifier),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
