//! # Tricks API Server
//!
//! Loads configuration, connects to PostgreSQL, applies pending migrations
//! and serves the router until Ctrl-C.
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/tricks JWT_SECRET=... cargo run -p tricks-api
//! ```
//!
//! Logs go to stdout, filtered by `RUST_LOG`. Production mode
//! (`API_PRODUCTION=true`) switches to JSON lines.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tricks_api::{
    app::{build_router, AppState},
    config::Config,
};
use tricks_shared::db::{migrations::run_migrations, pool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tricks_api=debug,tricks_shared=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.api.production {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Tricks API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&db).await?;

    tokio::fs::create_dir_all(&config.storage.archive_root).await?;
    tracing::info!(archive_root = %config.storage.archive_root.display(), "Archive storage ready");

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(db.clone(), config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    pool::close_pool(db).await;
    Ok(())
}
