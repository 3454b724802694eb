// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod extract;
mod handlers;

use crate::config::Config;
use crate::db::Database;
use crate::services::content::ContentService;
use crate::services::engagement::EngagementService;
use crate::services::feed::FeedService;
use crate::services::identity::IdentityService;
use anyhow::Result;
use axum::routing::{get, post, put};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared handler state: one service per component, all over the same pool.
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityService,
    pub content: ContentService,
    pub engagement: EngagementService,
    pub feed: FeedService,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            identity: IdentityService::new(db.clone()),
            content: ContentService::new(db.clone()),
            engagement: EngagementService::new(db.clone()),
            feed: FeedService::new(db),
        }
    }
}

/// Start the API server
pub async fn start_api_server(db: Arc<Database>) -> Result<()> {
    let config = Config::get();

    // Set up CORS
    let cors = if config.api.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::permissive()
    };

    let state = AppState::new(db);

    // Create router with all routes
    let app = Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::get_metrics))
        // User routes
        .route(
            "/api/users",
            get(handlers::users::search_users).post(handlers::users::register_user),
        )
        .route(
            "/api/users/:id",
            get(handlers::users::get_user).put(handlers::users::update_profile),
        )
        .route(
            "/api/users/:id/followers",
            get(handlers::users::get_followers),
        )
        .route(
            "/api/users/:id/following",
            get(handlers::users::get_following),
        )
        .route("/api/users/:id/follow", post(handlers::users::toggle_follow))
        // Post routes; the list endpoint is the viewer's feed
        .route(
            "/api/posts",
            get(handlers::posts::list_feed).post(handlers::posts::create_post),
        )
        .route(
            "/api/posts/:id",
            get(handlers::posts::get_post)
                .put(handlers::posts::update_post)
                .delete(handlers::posts::delete_post),
        )
        .route("/api/posts/:id/like", post(handlers::posts::toggle_like))
        // Comment routes
        .route(
            "/api/posts/:id/comments",
            get(handlers::comments::list_comments).post(handlers::comments::add_comment),
        )
        .route(
            "/api/comments/:id",
            put(handlers::comments::update_comment).delete(handlers::comments::delete_comment),
        )
        // Hashtag routes
        .route("/api/hashtags", get(handlers::hashtags::list_hashtags))
        .route("/api/hashtags/:name", get(handlers::hashtags::get_hashtag))
        // Add state and middleware
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        );

    // Get bind address
    let addr = format!("{}:{}", config.api.host, config.api.port).parse::<SocketAddr>()?;

    // Start server
    info!("Starting API server on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, initiating graceful shutdown"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
