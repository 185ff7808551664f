use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use translation_service::cache::ExportCache;
use translation_service::config::Config;
use translation_service::handlers::AppState;
use translation_service::routes::build_router;
use translation_service::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (absent in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_service=info".parse()?),
        )
        .init();

    info!("Starting translation service");

    // Load configuration from environment
    let config = Config::from_env()?;

    // Open the record store and bring the schema up to date
    let store = Store::connect(&config.database_url)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open record store: {e}"))?;
    info!(database_url = %config.database_url, "Record store ready");

    // Export cache lives for the duration of the process, initialized empty
    let state = AppState {
        store,
        cache: Arc::new(ExportCache::new()),
        config: Arc::new(config.clone()),
    };

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, app).await?;
    Ok(())
}
