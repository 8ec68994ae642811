use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scribe_api::{build_router, config::Config, state::AppState};
use scribe_llm::OpenAIClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Scribe API server");
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        model = %config.llm.model,
        output_mode = %config.output.mode,
        "Config loaded"
    );

    let system_prompt = config
        .load_system_prompt()
        .map_err(|e| anyhow::anyhow!("Failed to load system prompt: {}", e))?;
    tracing::info!(path = %config.prompt.path.display(), "System prompt loaded");

    // One client for the whole process; sessions share its connection pool
    let client = OpenAIClient::new(&config.provider())?;
    tracing::info!(url = client.completions_url(), "LLM client ready");

    let state = Arc::new(AppState::new(config.clone(), client, system_prompt));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
