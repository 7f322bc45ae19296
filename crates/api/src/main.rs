use alumnet_api::{build_router, state::AppState};
use alumnet_config::Settings;
use alumnet_services::open_store;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "alumnet_api=debug,alumnet_services=debug,alumnet_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!("Starting AlumNet API on {}:{}", settings.app.host, settings.app.port);
    info!(
        backend = ?settings.store.backend,
        enforce_transitions = settings.lifecycle.enforce_transitions,
        utc_offset_minutes = settings.lifecycle.utc_offset_minutes,
        "Lifecycle config"
    );

    // Connects and ensures indexes for the Mongo backend
    let store = open_store(&settings).await?;

    let app_state = AppState::new(store, settings.clone());
    let app = build_router(app_state);

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
