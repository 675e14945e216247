mod api;
mod assistant;
mod auth;
mod coercion;
mod config;
mod database;
mod errors;
mod explainer;
mod extraction;
mod logging;
mod mentor;
mod model_client;
mod models;
mod quiz;
mod summarizer;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api::{AppState, create_router},
    assistant::AssistantService,
    auth::AuthService,
    config::Config,
    database::Database,
    explainer::ExplainerService,
    mentor::MentorService,
    model_client::GenerativeProvider,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _guard = setup_logging(&config)?;

    // A missing model API key fails here, before anything is served.
    config.validate()?;

    info!("Starting EduLearn backend...");

    let db = Database::new(&config.database.url).await?;
    info!("Database initialized successfully");

    let provider = GenerativeProvider::from_config(&config.model);
    info!(
        provider = provider.provider_name(),
        model = provider.model_name(),
        "Initialized generative model client"
    );

    let state = AppState {
        assistant: AssistantService::new(provider.clone()),
        mentor: MentorService::new(provider.clone()),
        explainer: ExplainerService::new(provider),
        auth: AuthService::new(db, &config.auth),
    };

    let app = create_router(state).layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn setup_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    use std::fs;
    use tracing_subscriber::fmt;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true);

    if !config.logging.file_enabled {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();
        return Ok(None);
    }

    fs::create_dir_all(&config.logging.log_directory).unwrap_or_else(|e| {
        eprintln!("Warning: Could not create logs directory: {}", e);
    });

    // Daily-rotated file output alongside the console
    let file_appender =
        tracing_appender::rolling::daily(&config.logging.log_directory, "edulearn-backend.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(non_blocking_file);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(
        "Logging initialized - writing to {}/edulearn-backend.log with daily rotation",
        config.logging.log_directory
    );

    Ok(Some(guard))
}
