use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use visionary_ai::{create_app, AppState, Config, GeminiClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load();

    let state = Arc::new(AppState {
        inference: Arc::new(GeminiClient::from_config(&config)),
        preprocessing: config.preprocessing(),
        max_upload_bytes: config.max_upload_bytes(),
    });

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!("🚀 Server running on http://{}", config.bind);
    info!("📸 Open in your browser to start analyzing!");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
