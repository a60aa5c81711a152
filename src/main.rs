use tracing_subscriber::EnvFilter;

use resume_qa::api;
use resume_qa::config::Config;
use resume_qa::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Resume data: {}", config.resume_path.display());
    tracing::info!(
        "Embedding provider: {} ({})",
        config.llm.provider,
        config.llm.base_url
    );

    let state = AppState::new(config.clone())?;

    // Keep serving on failure; answers then report the system is not initialized
    if !state.qa.initialize().await {
        tracing::warn!("QA system failed to initialize");
    }

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
