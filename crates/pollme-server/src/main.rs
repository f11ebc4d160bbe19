use anyhow::Result;
use clap::Parser;
use pollme_core::AppState;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pollme=info,tower_http=debug")),
        )
        .init();

    let args = cli::Args::parse();
    let config = config::Config::load(&args.config)?;
    let app_config = config.app_config()?;

    ensure_data_dir(&config.database.url);

    let db = pollme_db::create_pool(&config.database.url, config.database.max_connections).await?;
    pollme_db::run_migrations(&db).await?;

    let state = AppState {
        db,
        config: app_config,
    };

    let app = pollme_api::build_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        bind_address = %config.server.bind_address,
        database = %config.database.url,
        "pollme server listening"
    );

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down...");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

/// Create the parent directory of a file-backed SQLite URL.
fn ensure_data_dir(database_url: &str) {
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return;
    };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return;
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create data directory {:?}: {}", parent, e);
            }
        }
    }
}
