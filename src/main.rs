use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub(crate) mod auth;
pub(crate) mod config;
pub(crate) mod errors;
pub(crate) mod models;
mod router;
mod routes;
pub(crate) mod srs;
pub(crate) mod store;

use crate::{
    router::AppState,
    srs::SystemClock,
    store::{memory::MemoryFlashcardStore, postgres::PgFlashcardStore},
};

async fn build_router(config: config::AppConfig) -> anyhow::Result<Router> {
    let clock = Arc::new(SystemClock);
    let database_url = config.database_url.clone();
    let router = match database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url.expose_secret())
                .await
                .context("Failed to connect to database")?;
            sqlx::migrate!()
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            info!("Using PostgreSQL flashcard store");
            let state = AppState {
                store: PgFlashcardStore::new(pool),
                clock,
            };
            router::init_router(state, config)
        }
        None => {
            warn!("DATABASE_URL not set, flashcards are kept in memory only");
            let state = AppState {
                store: MemoryFlashcardStore::new(),
                clock,
            };
            router::init_router(state, config)
        }
    };
    Ok(router)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("study_planner=info")),
        )
        .init();

    let config = config::AppConfig::from_env()?;
    let bind_addr = config.bind_addr;
    let router = build_router(config).await?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}
