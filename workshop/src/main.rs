use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workshop::api::{create_router, AppState};
use workshop::config::Config;
use workshop::db::catalog::seed_default_catalog;
use workshop::db::{Database, DatabaseBackend, LibSqlBackend};
use workshop::llm::LlmProvider;

#[derive(Parser)]
#[command(name = "workshop")]
#[command(about = "Self-hostable gift workshop with a streamed AI pipeline")]
struct Args {
    /// Do not insert the built-in gift catalog into an empty database
    #[arg(long)]
    skip_catalog_seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workshop=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "WORKSHOP_API_KEYS is not set, catalog writes and admin endpoints are locked"
        );
    }

    tracing::info!("Initializing database...");
    let raw_db = Database::new(&config.database).await?;
    let db: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(raw_db));

    if args.skip_catalog_seed {
        tracing::info!("Skipping gift catalog seed");
    } else {
        seed_default_catalog(&*db).await?;
    }

    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }
    let llm = LlmProvider::new(config.llm.as_ref());
    if !llm.is_available() {
        tracing::warn!("LLM unavailable - pipeline runs will fail at their first stage");
    }

    let cancel_token = CancellationToken::new();
    let state = AppState::new(config.clone(), db, llm, cancel_token.child_token());

    if state.config.retention.enabled {
        tracing::info!(
            "Starting retention manager... (max_age_days={}, interval={}s)",
            state.retention.max_age_days(),
            state.retention.interval_secs()
        );
        let manager = state.retention.clone();
        let token = cancel_token.child_token();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Retention manager shutting down...");
                        break;
                    }
                    _ = tokio::time::sleep(tokio::time::Duration::from_secs(manager.interval_secs())) => {
                        if let Err(e) = manager.run_once().await {
                            tracing::error!("Retention manager error: {}", e);
                        }
                    }
                }
            }
        });
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Workshop starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling pipeline runs and background tasks...");
    cancel_token.cancel();
}
