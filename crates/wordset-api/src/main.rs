use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wordset_ai::{DefinitionGenerator, OpenAiGenerator};
use wordset_api::{create_router, ApiState, AppConfig};
use wordset_db::Database;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wordset_api=debug,wordset_service=debug,wordset_db=info,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize database
    let db = Database::new(&config.database_config()).await?;
    db.init_schema().await?;
    db.reap_pending_tasks().await?;

    // Initialize generator
    let openai = config
        .openai_config()
        .context("WORDSET__OPENAI__API_KEY must be set")?;
    let generator: Arc<dyn DefinitionGenerator> = Arc::new(OpenAiGenerator::new(openai)?);

    // Create app state
    let state = ApiState::new(db.clone(), generator, config.fill_config());
    let runner = state.runner.clone();

    // Build router
    let app = create_router(state, config.request_timeout());

    // Start server
    let addr = format!("0.0.0.0:{}", config.server.port);
    tracing::info!(%addr, "Wordset API server running");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let running fill tasks reach a terminal state before the pool goes away
    runner.shutdown().await;
    db.close().await;

    tracing::info!("Wordset API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
