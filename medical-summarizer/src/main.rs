use anyhow::Context;
use medical_summarizer::{AppConfig, create_app};
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AppConfig::from_env().context("failed to load configuration")?;
    info!("Successfully loaded API key, using model {}", config.provider.model);

    let app = create_app(&config)?;
    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    let addr = listener.local_addr()?;

    info!("Medical Note Summarizer starting on {}", addr);
    info!("Health check endpoint: http://{}/health", addr);
    info!("Summarize endpoint: POST http://{}/summarize", addr);
    info!("Feedback endpoint: POST http://{}/feedback", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
