//! # Lectern - Quizhall quiz service
//!
//! Creators publish quizzes; signed-in users fetch them with answers
//! hidden, submit attempts, and get graded within a per-quiz attempt limit.
//!
//! ## Architecture
//! ```text
//! Client → Lectern (axum) → QuizService → ParticipationTracker
//!                                ↓
//!                     QuizStore (Redis | memory)
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod auth;
mod config;
mod quiz;
mod routes;
mod state;
mod store;

use config::{AppConfig, StorageBackend};
use state::AppState;

/// Lectern - Quizhall quiz service
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(author, version, about, long_about = None)]
pub(crate) struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/lectern.toml")]
    config: String,

    /// Redis URL (overrides config)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Storage backend (overrides config)
    #[arg(long, env = "STORAGE", value_enum)]
    storage: Option<StorageBackend>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level, args.json_logs)?;

    info!("📚 Starting Lectern v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(&args.config, &args)?;
    info!("📋 Configuration loaded from {}", args.config);

    if config.admin_token.is_none() {
        info!("Admin routes disabled (no admin_token configured)");
    }

    let state = AppState::new(config.clone()).await?;
    info!(storage = ?config.storage, "✅ Storage ready");

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("🚀 Lectern listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("👋 Lectern shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("🛑 Shutdown signal received"),
        Err(err) => error!(error = %err, "Failed to listen for Ctrl+C"),
    }
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    Ok(())
}
