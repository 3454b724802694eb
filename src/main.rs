use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mys_social_api::api;
use mys_social_api::config::Config;
use mys_social_api::db::init_database;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,mys_social_api=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    Config::init()?;
    info!("Initialized configuration");

    // Initialize database
    let db = Arc::new(init_database().await?);
    info!("Connected to database");

    // Serve the API until a shutdown signal arrives
    api::start_api_server(db).await?;

    info!("Social API shutdown complete");
    Ok(())
}
